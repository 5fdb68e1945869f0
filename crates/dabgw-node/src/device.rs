use tracing::debug;

use dabgw_codec::payload::Confirmation;
use dabgw_core::Reach;

use crate::strategy::{AckOutcome, Strategy, StrategyKind};

/// A configured transport endpoint able to acknowledge messages.
pub struct Device {
    pub name: String,
    /// Manufacturer/owner grouping.
    pub branch: String,
    pub model: String,
    /// Free-form technology label ("Wifi", "4G", a radio band id).
    pub technology: String,
    /// Lower value wins selection.
    pub priority: i32,
    strategy: Strategy,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        branch: impl Into<String>,
        model: impl Into<String>,
        technology: impl Into<String>,
        priority: i32,
        strategy: Strategy,
    ) -> Self {
        Self {
            name: name.into(),
            branch: branch.into(),
            model: model.into(),
            technology: technology.into(),
            priority,
            strategy,
        }
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Replaces the bound strategy (testing/hot-swap).
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Sends one confirmation through the bound strategy.
    pub fn acknowledge(&mut self, confirmation: &Confirmation) -> AckOutcome {
        debug!(
            "confirming dab message {} via {}",
            confirmation.dab_id, self.name
        );
        self.strategy.communicate(confirmation)
    }

    /// Estimates whether this device currently has a path to a receiver.
    ///
    /// AIS cannot know; Ethernet and the bus companions answer a
    /// capability query.
    pub fn estimate_reach(&mut self) -> Reach {
        match &mut self.strategy {
            Strategy::Ais(_) => Reach::Unknown,
            Strategy::Ethernet(strategy) => {
                if strategy.query_reach(&self.technology) {
                    Reach::Reachable
                } else {
                    Reach::NoReach
                }
            }
            Strategy::I2c(strategy) | Strategy::Spi(strategy) => {
                if strategy.query_reach() {
                    Reach::Reachable
                } else {
                    Reach::NoReach
                }
            }
        }
    }
}
