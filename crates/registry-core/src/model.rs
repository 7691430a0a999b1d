//! Core value types: [`BufferLocation`], [`RegItem`], [`Filter`].

/// An opaque network endpoint carried by a `Far` [`BufferLocation`].
///
/// Cross-host shared memory is out of scope for this system (see the
/// Non-goals); `Far` locations are reserved in the type model so the
/// RPC wire shapes and the in-process types stay aligned, but nothing
/// in this crate ever constructs one from a real socket address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetEndpoint {
    pub host: String,
    pub port: u16,
}

/// Where a named ring can be found.
///
/// `Near` locations omit an address (the ring lives in local shared
/// memory); `Far` locations carry an endpoint. Two locations compare equal
/// iff their `name` fields match — the region and address are identifying
/// metadata, not part of the key.
#[derive(Clone, Debug)]
pub enum BufferLocation {
    Near { name: String },
    Far { name: String, addr: NetEndpoint },
}

impl BufferLocation {
    /// Constructs a `Near` location. Panics if `name` is shorter than 2
    /// bytes, matching the original constructor's `assert(size(name)>1)`.
    pub fn near(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(name.len() > 1, "buffer location name must be >1 byte");
        Self::Near { name }
    }

    /// Constructs a `Far` location. Panics under the same length
    /// constraint as [`BufferLocation::near`].
    pub fn far(name: impl Into<String>, addr: NetEndpoint) -> Self {
        let name = name.into();
        assert!(name.len() > 1, "buffer location name must be >1 byte");
        Self::Far { name, addr }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Near { name } | Self::Far { name, .. } => name,
        }
    }
}

impl PartialEq for BufferLocation {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
impl Eq for BufferLocation {}

/// `(owner, BufferLocation)` entry inside the registry.
///
/// Equality is by `(owner, location.name)`, not by the full location —
/// two entries with the same owner and channel name are the same entry
/// even if one somehow carried a different region or address.
#[derive(Clone, Debug)]
pub struct RegItem {
    owner: String,
    location: BufferLocation,
}

impl RegItem {
    /// Panics if `owner` is empty, matching the original's
    /// `assert(size(name_)>0)`.
    pub fn new(owner: impl Into<String>, location: BufferLocation) -> Self {
        let owner = owner.into();
        assert!(!owner.is_empty(), "owner must not be empty");
        Self { owner, location }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn location(&self) -> &BufferLocation {
        &self.location
    }
}

impl PartialEq for RegItem {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.location.name() == other.location.name()
    }
}
impl Eq for RegItem {}

/// A substring pattern over `owner`.
///
/// `Filter(text)` matches a [`RegItem`] `r` iff `text` is a substring of
/// `r.owner()`. Filter equality is textual.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    text: String,
}

impl Filter {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn matches_owner(&self, owner: &str) -> bool {
        owner.contains(&self.text)
    }

    pub fn matches(&self, item: &RegItem) -> bool {
        self.matches_owner(item.owner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_item_equality_ignores_region_and_addr() {
        let a = RegItem::new("p", BufferLocation::near("/shared_mem_01"));
        let b = RegItem::new(
            "p",
            BufferLocation::far(
                "/shared_mem_01",
                NetEndpoint {
                    host: "10.0.0.1".into(),
                    port: 40040,
                },
            ),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn reg_item_inequality_by_owner_or_name() {
        let a = RegItem::new("p", BufferLocation::near("/shared_mem_01"));
        let different_owner = RegItem::new("q", BufferLocation::near("/shared_mem_01"));
        let different_name = RegItem::new("p", BufferLocation::near("/shared_mem_02"));
        assert_ne!(a, different_owner);
        assert_ne!(a, different_name);
    }

    #[test]
    fn filter_matches_substring_only() {
        let f = Filter::new("host_process");
        assert!(f.matches_owner("host_process_01"));
        assert!(!f.matches_owner("xyz"));
    }
}
