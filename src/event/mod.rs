// Live notification of committed writes
//
// Writers publish after each successful store write; HTTP subscribers
// receive the stream and re-read the projections they display.

pub use bus::EventBus;
pub use events::LeagueEvent;

mod bus;
mod events;
