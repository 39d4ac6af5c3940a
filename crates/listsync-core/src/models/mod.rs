pub mod bookmark;
pub mod contact;
pub mod item;
pub mod mute;
pub mod tag_utils;
pub mod tribe;

pub use bookmark::{BookmarkItem, BookmarkTagType};
pub use contact::ContactItem;
pub use item::{now_secs, ListItem, Visibility};
pub use mute::{MuteItem, MuteTarget};
pub use tag_utils::RawTag;
pub use tribe::{TribeMember, ROOT_CATEGORY_TITLE};
