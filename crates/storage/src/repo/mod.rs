pub mod commenters;
pub mod comments;
pub mod domains;
pub mod pages;
pub mod votes;
