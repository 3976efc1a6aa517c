//! Permission overwrites applied to managed channels.
//!
//! Only the handful of permissions this service touches are modelled. Each
//! one is tri-state: `Some(true)` allows, `Some(false)` denies and `None`
//! inherits from the category / role defaults. Every other permission is
//! kept as raw platform bits so copied overwrites survive unchanged.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{RoleId, UserId};

/// Per-target permission overwrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PermissionOverwrite {
    /// See the channel.
    pub view_channel: Option<bool>,
    /// Join a voice channel.
    pub connect: Option<bool>,
    /// Speak in a voice channel.
    pub speak: Option<bool>,
    /// Rename / edit the channel.
    pub manage_channels: Option<bool>,
    /// Edit the channel's overwrites.
    pub manage_permissions: Option<bool>,
    /// Raw allow bits of permissions not modelled above.
    pub other_allow: u64,
    /// Raw deny bits of permissions not modelled above.
    pub other_deny: u64,
}

impl PermissionOverwrite {
    /// An overwrite that changes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            view_channel: None,
            connect: None,
            speak: None,
            manage_channels: None,
            manage_permissions: None,
            other_allow: 0,
            other_deny: 0,
        }
    }

    /// Sets `view_channel`.
    #[must_use]
    pub const fn view_channel(mut self, value: bool) -> Self {
        self.view_channel = Some(value);
        self
    }

    /// Sets `connect`.
    #[must_use]
    pub const fn connect(mut self, value: bool) -> Self {
        self.connect = Some(value);
        self
    }

    /// Sets `speak`.
    #[must_use]
    pub const fn speak(mut self, value: bool) -> Self {
        self.speak = Some(value);
        self
    }

    /// Sets `manage_channels`.
    #[must_use]
    pub const fn manage_channels(mut self, value: bool) -> Self {
        self.manage_channels = Some(value);
        self
    }

    /// Sets `manage_permissions`.
    #[must_use]
    pub const fn manage_permissions(mut self, value: bool) -> Self {
        self.manage_permissions = Some(value);
        self
    }

    /// Sets the raw allow and deny bits of unmodelled permissions.
    #[must_use]
    pub const fn other(mut self, allow: u64, deny: u64) -> Self {
        self.other_allow = allow;
        self.other_deny = deny;
        self
    }

    /// Returns `true` if no permission is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.view_channel.is_none()
            && self.connect.is_none()
            && self.speak.is_none()
            && self.manage_channels.is_none()
            && self.manage_permissions.is_none()
            && self.other_allow == 0
            && self.other_deny == 0
    }
}

/// Who an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OverwriteTarget {
    /// Every member holding the role.
    Role(RoleId),
    /// A single member.
    Member(UserId),
}

/// Overwrite set of a channel, one entry per target.
///
/// Inserting for an existing target replaces the previous entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Overwrites(BTreeMap<OverwriteTarget, PermissionOverwrite>);

impl Overwrites {
    /// Empty overwrite set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite for `target`, returning the one it replaced.
    pub fn insert(
        &mut self,
        target: OverwriteTarget,
        overwrite: PermissionOverwrite,
    ) -> Option<PermissionOverwrite> {
        self.0.insert(target, overwrite)
    }

    /// Overwrite for `target`, if any.
    #[must_use]
    pub fn get(&self, target: &OverwriteTarget) -> Option<&PermissionOverwrite> {
        self.0.get(target)
    }

    /// Iterates entries in target order (roles first, then members).
    pub fn iter(&self) -> impl Iterator<Item = (&OverwriteTarget, &PermissionOverwrite)> {
        self.0.iter()
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members explicitly allowed to view the channel.
    #[must_use]
    pub fn members_with_view(&self) -> Vec<UserId> {
        self.0
            .iter()
            .filter_map(|(target, ow)| match target {
                OverwriteTarget::Member(user) if ow.view_channel == Some(true) => Some(*user),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<(OverwriteTarget, PermissionOverwrite)> for Overwrites {
    fn from_iter<I: IntoIterator<Item = (OverwriteTarget, PermissionOverwrite)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Overwrites for a linked text channel: the default role cannot see it,
/// every current voice member can.
#[must_use]
pub fn membership_overwrites(default_role: RoleId, members: &[UserId]) -> Overwrites {
    let mut overwrites = Overwrites::new();
    overwrites.insert(
        OverwriteTarget::Role(default_role),
        PermissionOverwrite::new().view_channel(false),
    );
    for member in members {
        overwrites.insert(
            OverwriteTarget::Member(*member),
            PermissionOverwrite::new().view_channel(true),
        );
    }
    overwrites
}
