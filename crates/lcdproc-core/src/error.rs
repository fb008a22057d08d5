//! Error types for the LCDproc domain model.
//!
//! These are model-level failures. The server turns them into `huh?` replies
//! or log lines; none of them is fatal to the process.

use thiserror::Error;

/// A key reservation conflicts with an existing one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReserveError {
    /// Key already reserved exclusively, or an exclusive reservation was
    /// requested for a key that is already in use
    #[error("key {key:?} is already reserved")]
    Conflict {
        /// Key name
        key: String,
    },
}

/// Failures of the menu state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// The active item cannot handle this input
    #[error("item {id:?} rejected the input")]
    Rejected {
        /// Active item id
        id: String,
    },

    /// A predecessor or successor link names an item that does not exist
    #[error("navigation target {target:?} of item {id:?} not found")]
    TargetNotFound {
        /// Item whose link was followed
        id: String,
        /// Missing target id
        target: String,
    },

    /// A menu was entered but has no selectable entry
    #[error("menu {id:?} has no entry to select")]
    NoSelection {
        /// Menu id
        id: String,
    },
}

/// Failures of menu tree edits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// Item id already used in the search scope
    #[error("item id {id:?} already in use")]
    DuplicateId {
        /// Offending id
        id: String,
    },

    /// Parent is not a menu
    #[error("item {id:?} is not a menu")]
    NotAMenu {
        /// Item that was expected to be a menu
        id: String,
    },

    /// Item handle does not refer to a live item
    #[error("unknown menu item")]
    Unknown,
}

/// Failures of the client menu commands. The display text is the message
/// sent back in the `huh?` reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientMenuError {
    /// Client menus are titled with the client name
    #[error("You need to give your client a name first")]
    Unnamed,

    /// Parent or target menu does not exist
    #[error("Cannot find menu id")]
    MenuNotFound,

    /// Item id already used in the client's menu
    #[error("Item id already in use")]
    DuplicateId,

    /// Unknown item type name
    #[error("Invalid menuitem type")]
    InvalidType,

    /// Client never added a menu item
    #[error("Client has no menu")]
    NoMenu,

    /// Item does not exist
    #[error("Cannot find item")]
    ItemNotFound,
}
