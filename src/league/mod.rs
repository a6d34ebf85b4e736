// Tournament aggregation, league projections and the league HTTP surface
pub use errors::LeagueError;
pub use handlers::{
    assistant_context, catalog, create_player, delete_player, events, export_backup, health, history,
    import_backup, leaderboard, player_profile, reconcile_all, reconcile_player,
    record_tournament, rename_player, stats,
};
pub use service::LeagueService;

pub mod aggregation;
pub mod backup;
mod errors;
pub mod generators;
mod handlers;
pub mod models;
pub mod projection;
pub mod repository;
pub mod service;
pub mod types;
