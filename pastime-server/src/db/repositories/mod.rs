mod user_repository;
mod post_repository;
mod hobby_repository;
mod friend_repository;
mod group_repository;
mod saved_repository;

pub use user_repository::{is_unique_violation, UserRepository};
pub use post_repository::PostRepository;
pub use hobby_repository::HobbyRepository;
pub use friend_repository::FriendRepository;
pub use group_repository::GroupRepository;
pub use saved_repository::SavedPostRepository;
