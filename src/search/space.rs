//! Collaborator interfaces: configurations, spaces and operators.
//!
//! A search is defined over a [`ConfigurationSpace`] that also implements
//! [`Operators`]. A [`SpaceList`] combines several spaces producing different
//! kinds of configuration (for example polynomials of different degrees) and
//! dispatches each operation to the first space that produces the
//! configuration's type tag.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::error::{Result, SearchError};
use super::rng::SearchRng;

/// Identifier of a configuration kind, used for dispatch and crossover
/// compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Create a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// One candidate solution.
///
/// Equality and hashing must be by value: the observed set relies on them to
/// never evaluate the same configuration twice.
pub trait Configuration: Clone + Eq + Hash + fmt::Debug + Send + Sync {
    /// The kind of this configuration.
    fn type_tag(&self) -> TypeTag;
}

/// Source of fresh random configurations.
pub trait ConfigurationSpace {
    /// Configuration type produced by this space.
    type Config: Configuration;

    /// Sample a fresh random configuration.
    fn sample(&self, rng: &mut SearchRng) -> Self::Config;

    /// Type tag of the configurations this space produces.
    fn element_type(&self) -> TypeTag;

    /// Whether this space produces configurations tagged `tag`.
    fn produces(&self, tag: &TypeTag) -> bool {
        self.element_type() == *tag
    }
}

/// Variation operators over a space's configurations.
///
/// Both operators return `Err` only for fatal setup errors such as
/// [`SearchError::Incompatible`]; they must not be used to reject a
/// configuration (that is what `accept_config` is for).
pub trait Operators: ConfigurationSpace {
    /// Single-parent perturbation. `iter` is the current round (1-based) so
    /// operators can anneal their step size.
    fn mutate(
        &self,
        config: &Self::Config,
        iter: usize,
        rng: &mut SearchRng,
    ) -> Result<Self::Config>;

    /// Two-parent combination. Both parents share a type tag.
    fn combine(
        &self,
        a: &Self::Config,
        b: &Self::Config,
        rng: &mut SearchRng,
    ) -> Result<Self::Config>;
}

/// Ordered list of spaces sharing one configuration type.
#[derive(Debug, Clone)]
pub struct SpaceList<S> {
    spaces: Vec<S>,
}

impl<S: ConfigurationSpace> SpaceList<S> {
    /// Create from a non-empty list of spaces.
    pub fn new(spaces: Vec<S>) -> Result<Self> {
        if spaces.is_empty() {
            return Err(SearchError::EmptySpaceList);
        }
        Ok(Self { spaces })
    }

    /// First space producing configurations tagged `tag`.
    pub fn resolve(&self, tag: &TypeTag) -> Result<&S> {
        self.spaces
            .iter()
            .find(|space| space.produces(tag))
            .ok_or_else(|| SearchError::Incompatible { tag: tag.clone() })
    }

    /// Mutable access to the first space producing `tag`.
    pub fn resolve_mut(&mut self, tag: &TypeTag) -> Result<&mut S> {
        self.spaces
            .iter_mut()
            .find(|space| space.produces(tag))
            .ok_or_else(|| SearchError::Incompatible { tag: tag.clone() })
    }

    /// Member spaces in dispatch order.
    pub fn spaces(&self) -> &[S] {
        &self.spaces
    }

    /// Mutable member spaces, for adaptation from `inspect_population`.
    pub fn spaces_mut(&mut self) -> &mut [S] {
        &mut self.spaces
    }

    /// Number of member spaces.
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Always false; lists are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

impl<S: ConfigurationSpace> ConfigurationSpace for SpaceList<S> {
    type Config = S::Config;

    /// Sample from a member space chosen uniformly at random.
    fn sample(&self, rng: &mut SearchRng) -> Self::Config {
        let idx = rng.index(self.spaces.len());
        self.spaces[idx].sample(rng)
    }

    /// Tag of the first member space. Use [`ConfigurationSpace::produces`]
    /// to test membership.
    fn element_type(&self) -> TypeTag {
        self.spaces[0].element_type()
    }

    fn produces(&self, tag: &TypeTag) -> bool {
        self.spaces.iter().any(|space| space.produces(tag))
    }
}

impl<S: Operators> Operators for SpaceList<S> {
    fn mutate(
        &self,
        config: &Self::Config,
        iter: usize,
        rng: &mut SearchRng,
    ) -> Result<Self::Config> {
        self.resolve(&config.type_tag())?.mutate(config, iter, rng)
    }

    fn combine(
        &self,
        a: &Self::Config,
        b: &Self::Config,
        rng: &mut SearchRng,
    ) -> Result<Self::Config> {
        self.resolve(&a.type_tag())?.combine(a, b, rng)
    }
}
