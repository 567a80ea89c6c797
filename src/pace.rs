use std::time::Duration;

/// What one tick owes the remote side: always the short pause, plus the
/// long rest when the counter runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Short,
    ShortThenRest,
}

/// Paces network-touching pipeline iterations. Every tick sleeps for the
/// short duration; after `rest_every` ticks a single long rest is inserted
/// and the counter resets. Iterations that touched no network resource
/// must not tick.
#[derive(Debug)]
pub struct Delayer {
    short: Duration,
    rest: Duration,
    rest_every: u32,
    remaining: u32,
}

impl Delayer {
    pub fn new(rest_every: u32, short: Duration, rest: Duration) -> Self {
        let rest_every = rest_every.max(1);
        Self {
            short,
            rest,
            rest_every,
            remaining: rest_every,
        }
    }

    fn advance(&mut self) -> Pace {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.remaining = self.rest_every;
            Pace::ShortThenRest
        } else {
            Pace::Short
        }
    }

    pub async fn tick(&mut self) {
        tokio::time::sleep(self.short).await;
        if self.advance() == Pace::ShortThenRest {
            tracing::info!(
                rest = ?self.rest,
                "taking the long rest to avoid overwhelming the remote APIs"
            );
            tokio::time::sleep(self.rest).await;
        }
    }
}
