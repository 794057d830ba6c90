//! # Relations
//!
//! Relation helpers describe how two model types point at each other through
//! attribute values. They hold no owner instance; every operation takes the
//! owner as an argument.
//!
//! | Relation | Key held by | Default key names |
//! |----------|-------------|-------------------|
//! | [`BelongsTo`] | the owner (`local_key`) | `local_key` = `<owner>Id` |
//! | [`HasMany`] | the related rows (`foreign_key`) | `foreign_key` = `<owner>Id`, `local_key` = owner primary key |
//!
//! Default names are camel-cased from the owner's type name, so a `Post` has
//! many `Comment` rows through `comment.postId`, and a `Comment` belongs to its
//! related row through `comment.commentId`. Pass an explicit key when the
//! related type name should be used instead.

mod belongs_to;
mod has_many;

pub use belongs_to::BelongsTo;
pub use has_many::HasMany;

use opaque_inflector::camelize;

fn key_for(model_name: &str) -> String {
    camelize([model_name, "id"])
}
