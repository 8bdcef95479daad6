//! Whole-pipeline tests driving a [`SpawnDirector`](crate::SpawnDirector)
//! through simulated sessions

mod config_files;
mod scenarios;
