//! Domain types and models

pub mod dictator;

pub use dictator::{
    Achievement, CreateAchievementRequest, CreateDictatorRequest, Dictator,
    UpdateAchievementRequest, UpsertDictatorRequest,
};
