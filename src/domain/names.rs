//! Display-name styles for freshly created channel pairs.

use rand::Rng;
use rand::seq::SliceRandom;

use super::ChannelKind;

const PUBLIC_STYLES: [(&str, &str); 6] = [
    ("╠{}'s discussion", "{}'s discussion"),
    ("╠{}'s voice channel", "{}'s text channel"),
    ("╠{}'s room", "{}'s room"),
    ("╠{}'s open talk", "{}'s open talk"),
    ("╠{}'s bar", "{}'s bar"),
    ("╠{}'s public office", "{}'s public office"),
];

const PRIVATE_STYLES: [(&str, &str); 6] = [
    ("╠{}'s private discussion", "{}'s private discussion"),
    ("╠{}'s private fellowship", "{}'s private fellowship"),
    ("╠{}'s private room", "{}'s private room"),
    ("╠{}'s elite room", "{}'s elite room"),
    ("╠{}'s regular table", "{}'s regular table"),
    ("╠{}'s private haven", "{}'s private haven"),
];

/// Names for a voice channel and its linked text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNames {
    /// Voice channel name.
    pub voice: String,
    /// Linked text channel name.
    pub text: String,
}

/// Style table for `kind`.
#[must_use]
pub const fn styles(kind: ChannelKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ChannelKind::Public => &PUBLIC_STYLES,
        ChannelKind::Private => &PRIVATE_STYLES,
    }
}

/// Picks a style for `kind` with the given RNG and fills in `owner`.
pub fn pick_names<R: Rng + ?Sized>(kind: ChannelKind, owner: &str, rng: &mut R) -> ChannelNames {
    let (voice, text) = styles(kind)
        .choose(rng)
        .copied()
        .unwrap_or(("╠{}'s room", "{}'s room"));
    ChannelNames {
        voice: voice.replace("{}", owner),
        text: text.replace("{}", owner),
    }
}

/// Picks a style for `kind` using the thread-local RNG.
#[must_use]
pub fn random_names(kind: ChannelKind, owner: &str) -> ChannelNames {
    pick_names(kind, owner, &mut rand::thread_rng())
}
