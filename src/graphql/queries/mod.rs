use async_graphql::MergedObject;

mod activations;
mod performers;
mod studios;

pub use activations::ActivationQueries;
pub use performers::PerformerQueries;
pub use studios::StudioQueries;

#[derive(Default, MergedObject)]
pub struct QueryRoot(PerformerQueries, StudioQueries, ActivationQueries);
