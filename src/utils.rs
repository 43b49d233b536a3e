use crate::environments::Observation;
use crate::error::{Error, Result};

use tch::Tensor;

pub trait ToTensor {
    fn to_tensor(&self) -> Tensor;
}

impl ToTensor for Observation {
    fn to_tensor(&self) -> Tensor {
        Tensor::from_slice(self.as_ref()).unsqueeze(0)
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 总体方差（除以 n）
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn plot_rewards(rewards: &[f32], filename: &str, title: &str) -> Result<()> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| Error::Plot(e.to_string()))?;

    // 奖励可能为负
    let max_reward = rewards.iter().cloned().fold(f32::MIN, f32::max).max(1.0);
    let min_reward = rewards.iter().cloned().fold(f32::MAX, f32::min).min(0.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32).into_font())
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..rewards.len().max(1), min_reward..max_reward)
        .map_err(|e| Error::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Episode")
        .y_desc("Total Reward")
        .axis_desc_style(("sans-serif", 22))
        .label_style(("sans-serif", 18))
        .light_line_style(&WHITE.mix(0.3))
        .draw()
        .map_err(|e| Error::Plot(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            rewards.iter().enumerate().map(|(i, r)| (i, *r)),
            &BLUE,
        ))
        .map_err(|e| Error::Plot(e.to_string()))?
        .label("Reward")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 18))
        .draw()
        .map_err(|e| Error::Plot(e.to_string()))?;

    root.present().map_err(|e| Error::Plot(e.to_string()))?;
    tracing::info!("Saved training plot to {}", filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_is_population_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(population_variance(&values), 4.0);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
        assert_eq!(population_variance(&[3.5]), 0.0);
    }

    #[test]
    fn observation_tensor_has_batch_dim() {
        let obs = Observation::new(1.0, 0.5, 5.0, 0.3);
        assert_eq!(obs.to_tensor().size(), vec![1, 4]);
    }
}
