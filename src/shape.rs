//! Shape identifiers, auto-cycling groups and the per-shape lookup table.
//!
//! Every target the particle cloud can morph into is a variant of [`ShapeId`].
//! Storage keyed by shape uses [`ShapeTable`], which holds exactly one slot per
//! variant, so a lookup can never miss.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::UnknownShape;

/// A named target shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    /// The rotating planet. Home/idle sentinel.
    Sphere,
    /// "MB" monogram.
    Monogram,
    /// "WD" lettering.
    Developer,
    /// "</>" code glyphs.
    Code,
    /// Envelope icon.
    Email,
    /// "in" inside a rounded square.
    LinkedIn,
    /// Beetle icon, used as the companion that fills excess slots.
    Bug,
    /// Beamed eighth notes.
    Music,
    /// Camera body with lens.
    Camera,
    /// Game controller.
    Gamepad,
}

impl ShapeId {
    /// Number of shape variants.
    pub const COUNT: usize = 10;

    /// All shapes in table order.
    pub const ALL: [ShapeId; Self::COUNT] = [
        ShapeId::Sphere,
        ShapeId::Monogram,
        ShapeId::Developer,
        ShapeId::Code,
        ShapeId::Email,
        ShapeId::LinkedIn,
        ShapeId::Bug,
        ShapeId::Music,
        ShapeId::Camera,
        ShapeId::Gamepad,
    ];

    /// Position of this shape in [`ShapeId::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ShapeId::Sphere => 0,
            ShapeId::Monogram => 1,
            ShapeId::Developer => 2,
            ShapeId::Code => 3,
            ShapeId::Email => 4,
            ShapeId::LinkedIn => 5,
            ShapeId::Bug => 6,
            ShapeId::Music => 7,
            ShapeId::Camera => 8,
            ShapeId::Gamepad => 9,
        }
    }

    /// Whether this is the home sphere.
    #[inline]
    pub const fn is_home(self) -> bool {
        matches!(self, ShapeId::Sphere)
    }

    /// Stable lowercase name, also used for mask file names.
    pub const fn name(self) -> &'static str {
        match self {
            ShapeId::Sphere => "sphere",
            ShapeId::Monogram => "mb",
            ShapeId::Developer => "wd",
            ShapeId::Code => "code",
            ShapeId::Email => "email",
            ShapeId::LinkedIn => "linkedin",
            ShapeId::Bug => "bug",
            ShapeId::Music => "music",
            ShapeId::Camera => "camera",
            ShapeId::Gamepad => "gamepad",
        }
    }

    /// Shapes that are rasterized from glyphs or icons (everything but the sphere).
    pub fn rasterized() -> impl Iterator<Item = ShapeId> {
        Self::ALL.into_iter().filter(|s| !s.is_home())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of shapes that auto-advance while the machine is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeGroup {
    /// Email and LinkedIn icons.
    Contact,
    /// Music, camera and gamepad icons.
    Hobbies,
}

impl ShapeGroup {
    /// Members in cycle order.
    pub const fn members(self) -> &'static [ShapeId] {
        match self {
            ShapeGroup::Contact => &[ShapeId::Email, ShapeId::LinkedIn],
            ShapeGroup::Hobbies => &[ShapeId::Music, ShapeId::Camera, ShapeId::Gamepad],
        }
    }

    /// Member at `cycle`, wrapping.
    #[inline]
    pub fn member(self, cycle: usize) -> ShapeId {
        let members = self.members();
        members[cycle % members.len()]
    }
}

/// What the host asks the particle cloud to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShapeRequest {
    /// The rotating planet.
    #[default]
    Home,
    /// A single fixed shape.
    Shape(ShapeId),
    /// An auto-cycling group.
    Group(ShapeGroup),
}

impl ShapeRequest {
    /// Resolve to a concrete shape for the given cycle position.
    pub fn resolve(self, cycle: usize) -> ShapeId {
        match self {
            ShapeRequest::Home => ShapeId::Sphere,
            ShapeRequest::Shape(id) => id,
            ShapeRequest::Group(group) => group.member(cycle),
        }
    }

    /// The group, if this request auto-cycles.
    pub fn group(self) -> Option<ShapeGroup> {
        match self {
            ShapeRequest::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl From<ShapeId> for ShapeRequest {
    fn from(id: ShapeId) -> Self {
        if id.is_home() {
            ShapeRequest::Home
        } else {
            ShapeRequest::Shape(id)
        }
    }
}

impl From<ShapeGroup> for ShapeRequest {
    fn from(group: ShapeGroup) -> Self {
        ShapeRequest::Group(group)
    }
}

impl FromStr for ShapeRequest {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "home" | "sphere" | "none" | "planet" => Ok(ShapeRequest::Home),
            "contact" => Ok(ShapeRequest::Group(ShapeGroup::Contact)),
            "hobbies" => Ok(ShapeRequest::Group(ShapeGroup::Hobbies)),
            "</>" => Ok(ShapeRequest::Shape(ShapeId::Code)),
            "li" => Ok(ShapeRequest::Shape(ShapeId::LinkedIn)),
            _ => ShapeId::ALL
                .into_iter()
                .find(|id| id.name() == key)
                .map(ShapeRequest::from)
                .ok_or(UnknownShape(s.to_string())),
        }
    }
}

/// One value per [`ShapeId`], indexed by shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTable<T> {
    slots: [T; ShapeId::COUNT],
}

impl<T> ShapeTable<T> {
    /// Build a table by evaluating `f` for every shape.
    pub fn from_fn(mut f: impl FnMut(ShapeId) -> T) -> Self {
        Self {
            slots: ShapeId::ALL.map(&mut f),
        }
    }

    /// Iterate `(shape, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &T)> {
        ShapeId::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T: Default> Default for ShapeTable<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<ShapeId> for ShapeTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: ShapeId) -> &T {
        &self.slots[id.index()]
    }
}

impl<T> IndexMut<ShapeId> for ShapeTable<T> {
    #[inline]
    fn index_mut(&mut self, id: ShapeId) -> &mut T {
        &mut self.slots[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, id) in ShapeId::ALL.into_iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_group_member_wraps() {
        assert_eq!(ShapeGroup::Contact.member(0), ShapeId::Email);
        assert_eq!(ShapeGroup::Contact.member(1), ShapeId::LinkedIn);
        assert_eq!(ShapeGroup::Contact.member(2), ShapeId::Email);
        assert_eq!(ShapeGroup::Hobbies.member(4), ShapeId::Camera);
    }

    #[test]
    fn test_parse_requests() {
        assert_eq!("sphere".parse(), Ok(ShapeRequest::Home));
        assert_eq!("MB".parse(), Ok(ShapeRequest::Shape(ShapeId::Monogram)));
        assert_eq!("</>".parse(), Ok(ShapeRequest::Shape(ShapeId::Code)));
        assert_eq!(
            "contact".parse(),
            Ok(ShapeRequest::Group(ShapeGroup::Contact))
        );
        let err = "octopus".parse::<ShapeRequest>().unwrap_err();
        assert_eq!(err, UnknownShape("octopus".to_string()));
        assert_eq!(err.to_string(), "unknown shape `octopus`");
    }

    #[test]
    fn test_table_index() {
        let mut table: ShapeTable<u32> = ShapeTable::default();
        table[ShapeId::Camera] = 7;
        assert_eq!(table[ShapeId::Camera], 7);
        assert_eq!(table[ShapeId::Sphere], 0);
        assert_eq!(table.iter().count(), ShapeId::COUNT);
    }
}
