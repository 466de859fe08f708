//! Domain ports for the gateway boundary and slice persistence.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_source;
mod gateway_error;
mod goal_gateway;
mod nutrition_gateway;
mod snapshot_repository;
mod weight_gateway;
mod workout_gateway;

#[cfg(test)]
pub use credential_source::MockCredentialSource;
pub use credential_source::{CredentialSource, StaticCredentials};
pub use gateway_error::GatewayError;
#[cfg(test)]
pub use goal_gateway::MockGoalGateway;
pub use goal_gateway::GoalGateway;
#[cfg(test)]
pub use nutrition_gateway::MockNutritionGateway;
pub use nutrition_gateway::NutritionGateway;
#[cfg(test)]
pub use snapshot_repository::MockSnapshotRepository;
pub use snapshot_repository::{
    SliceKey, SnapshotRepository, SnapshotRepositoryError, UnknownSliceKey,
};
#[cfg(test)]
pub use weight_gateway::MockWeightGateway;
pub use weight_gateway::WeightGateway;
#[cfg(test)]
pub use workout_gateway::MockWorkoutGateway;
pub use workout_gateway::WorkoutGateway;
