//! Storage shapes for every entity the service manages.
//!
//! Branch-scoped entities carry an `id`, the [`BranchScope`](crate::BranchScope)
//! they were created under and their [`Stamps`](crate::Stamps), flattened into
//! the same JSON object. [`Notification`] and [`User`] are scoped by user and
//! organization instead and implement [`Record`](crate::Record) directly.

pub mod bank;
pub mod collateral;
pub mod funds;
pub mod member_asset;
pub mod member_profile;
pub mod member_type;
pub mod member_type_history;
pub mod notification;
pub mod tag_template;
pub mod user;

pub use bank::Bank;
pub use collateral::Collateral;
pub use funds::Funds;
pub use member_asset::MemberAsset;
pub use member_profile::MemberProfile;
pub use member_type::MemberType;
pub use member_type_history::MemberTypeHistory;
pub use notification::{Notification, NotificationType};
pub use tag_template::{TagCategory, TagTemplate};
pub use user::User;
