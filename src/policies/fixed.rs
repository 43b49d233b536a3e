use crate::environments::nodule_mining::{Action, ActuatorSetting};
use crate::error::Result;
use crate::policy::Policy;

/// Non-adaptive strategy: the same actuator setting every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPolicy {
    setting: ActuatorSetting,
    action: Action,
}

impl FixedPolicy {
    pub fn new(setting: ActuatorSetting) -> Self {
        Self {
            setting,
            action: setting.to_action(),
        }
    }

    pub fn setting(&self) -> ActuatorSetting {
        self.setting
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl Default for FixedPolicy {
    fn default() -> Self {
        Self::new(ActuatorSetting::NOMINAL)
    }
}

impl<S> Policy<S, Action> for FixedPolicy {
    fn select_action(&self, _state: &S) -> Result<Action> {
        Ok(self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_setting_maps_to_expected_action() {
        let policy = FixedPolicy::default();
        let [h, p] = policy.select_action(&()).unwrap();
        assert!((h - (0.4 / 0.45 - 1.0)).abs() < 1e-6);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn action_is_constant() {
        let policy = FixedPolicy::new(ActuatorSetting {
            height: 0.2,
            pressure: 8.0,
        });
        assert_eq!(
            policy.select_action(&1).unwrap(),
            policy.select_action(&2).unwrap()
        );
    }
}
