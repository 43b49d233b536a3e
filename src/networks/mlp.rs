use tch::nn;

pub struct MLP {
    pub model: nn::Sequential,
    pub var_store: nn::VarStore, // 保存 VarStore 的所有权
}

impl MLP {
    /// ReLU hidden layers, linear output.
    pub fn new(vs: nn::VarStore, input_dim: usize, hidden: &[usize], output_dim: usize) -> Self {
        let root = vs.root();
        let mut model = nn::seq();
        let mut in_dim = input_dim as i64;
        for (i, &width) in hidden.iter().enumerate() {
            model = model
                .add(nn::linear(
                    &root / format!("layer{}", i + 1),
                    in_dim,
                    width as i64,
                    Default::default(),
                ))
                .add_fn(|xs| xs.relu());
            in_dim = width as i64;
        }
        let model = model.add(nn::linear(
            &root / "output",
            in_dim,
            output_dim as i64,
            Default::default(),
        ));
        MLP {
            model,
            var_store: vs,
        }
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.var_store
    }
}
