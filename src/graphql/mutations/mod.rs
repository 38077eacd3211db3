use async_graphql::MergedObject;

mod invites;
mod performers;
mod studios;

pub use invites::InviteMutations;
pub use performers::PerformerMutations;
pub use studios::StudioMutations;

#[derive(Default, MergedObject)]
pub struct MutationRoot(PerformerMutations, StudioMutations, InviteMutations);
