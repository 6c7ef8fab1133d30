//! Static frame catalog.
//!
//! Frames are grouped into categories of interchangeable variants. The
//! catalog also carries labelled links between frames, which makes the
//! navigation stack an explicit path through a directed graph, and an
//! opaque per-frame descriptor table that only the rendering layer reads.
//!
//! A catalog is validated once, when it is built:
//! - every declared category has at least one frame
//! - the categories the session flow lands on are present
//! - a frame id belongs to exactly one category
//! - every link starts from a known frame and targets a present category

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CoreError};

/// Opaque identifier of a navigable screen, e.g. `"1:33"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FrameId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A logical screen. Each category owns one or more frame variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Home,
    /// Pre-action breathing countdown.
    Breathing,
    /// Emotion check-in (reflection step).
    Checkin,
    /// Back / delay / proceed choice (result step).
    Decision,
    Delay,
    ProceedInfo,
    Settings,
    Stats,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Home,
        Category::Breathing,
        Category::Checkin,
        Category::Decision,
        Category::Delay,
        Category::ProceedInfo,
        Category::Settings,
        Category::Stats,
    ];

    /// Categories the controller navigates to on its own.
    pub const REQUIRED: [Category; 6] = [
        Category::Home,
        Category::Breathing,
        Category::Checkin,
        Category::Decision,
        Category::Delay,
        Category::ProceedInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Home => "home",
            Category::Breathing => "breathing",
            Category::Checkin => "checkin",
            Category::Decision => "decision",
            Category::Delay => "delay",
            Category::ProceedInfo => "proceed_info",
            Category::Settings => "settings",
            Category::Stats => "stats",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CatalogError::Parse(format!("unknown category '{s}'")))
    }
}

/// A labelled edge from one frame to a category.
///
/// Following the link opens the category's current variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: FrameId,
    pub label: String,
    pub to: Category,
    #[serde(default)]
    pub replace: bool,
}

/// Rendering data for one frame, carried through untouched.
///
/// Hotspots are `[x, y, width, height]` in the 393x852 design space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<[u32; 4]>,
}

/// On-disk catalog shape.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    categories: BTreeMap<String, Vec<FrameId>>,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    frames: BTreeMap<String, FrameDescriptor>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    categories: BTreeMap<Category, Vec<FrameId>>,
    reverse: HashMap<FrameId, Category>,
    links: HashMap<FrameId, Vec<Link>>,
    frames: HashMap<FrameId, FrameDescriptor>,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(
        categories: impl IntoIterator<Item = (Category, Vec<FrameId>)>,
        links: Vec<Link>,
    ) -> Result<Self, CatalogError> {
        let categories: BTreeMap<Category, Vec<FrameId>> = categories.into_iter().collect();

        let mut reverse = HashMap::new();
        for (&category, frames) in &categories {
            if frames.is_empty() {
                return Err(CatalogError::EmptyCategory(category));
            }
            for frame in frames {
                if let Some(first) = reverse.insert(frame.clone(), category) {
                    return Err(CatalogError::DuplicateFrame {
                        frame: frame.clone(),
                        first,
                        second: category,
                    });
                }
            }
        }

        if let Some(missing) = Category::REQUIRED
            .into_iter()
            .find(|c| !categories.contains_key(c))
        {
            return Err(CatalogError::MissingCategory(missing));
        }

        let mut by_frame: HashMap<FrameId, Vec<Link>> = HashMap::new();
        for link in links {
            if !reverse.contains_key(&link.from) {
                return Err(CatalogError::DanglingLink {
                    from: link.from,
                    label: link.label,
                });
            }
            if !categories.contains_key(&link.to) {
                return Err(CatalogError::MissingCategory(link.to));
            }
            by_frame.entry(link.from.clone()).or_default().push(link);
        }

        Ok(Self {
            categories,
            reverse,
            links: by_frame,
            frames: HashMap::new(),
        })
    }

    /// Attach rendering descriptors. Entries for unknown frames are dropped.
    pub fn with_descriptors(
        mut self,
        frames: impl IntoIterator<Item = (FrameId, FrameDescriptor)>,
    ) -> Self {
        self.frames = frames
            .into_iter()
            .filter(|(id, _)| self.reverse.contains_key(id))
            .collect();
        self
    }

    /// The catalog shipped with the app.
    pub fn builtin() -> Self {
        let frames = |ids: &[&str]| ids.iter().map(|id| FrameId::from(*id)).collect::<Vec<_>>();
        let link = |from: &str, label: &str, to: Category, replace: bool| Link {
            from: FrameId::from(from),
            label: label.to_string(),
            to,
            replace,
        };

        Self::new(
            [
                (Category::Home, frames(&["1:2", "1:14"])),
                (Category::Breathing, frames(&["1:33", "1:58", "1:81"])),
                (Category::Checkin, frames(&["2:7", "2:19"])),
                (Category::Decision, frames(&["2:40", "2:52"])),
                (Category::Delay, frames(&["3:5"])),
                (Category::ProceedInfo, frames(&["3:21"])),
                (Category::Settings, frames(&["4:2"])),
                (Category::Stats, frames(&["4:30"])),
            ],
            vec![
                link("1:2", "settings", Category::Settings, false),
                link("1:2", "stats", Category::Stats, false),
                link("1:14", "settings", Category::Settings, false),
                link("1:14", "stats", Category::Stats, false),
                link("4:2", "stats", Category::Stats, true),
                link("4:30", "settings", Category::Settings, true),
            ],
        )
        .expect("built-in catalog is valid")
    }

    /// Parse a TOML catalog document.
    ///
    /// ```toml
    /// [categories]
    /// home = ["1:2"]
    ///
    /// [[links]]
    /// from = "1:2"
    /// label = "settings"
    /// to = "settings"
    ///
    /// [frames."1:2"]
    /// image = "home.png"
    /// hotspots = [[20, 700, 353, 56]]
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = toml::from_str(content)?;
        let mut categories = Vec::with_capacity(doc.categories.len());
        for (name, frames) in doc.categories {
            categories.push((name.parse::<Category>()?, frames));
        }
        let catalog = Self::new(categories, doc.links)?;
        Ok(catalog.with_descriptors(
            doc.frames
                .into_iter()
                .map(|(id, descriptor)| (FrameId::from(id), descriptor)),
        ))
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn contains(&self, frame: &FrameId) -> bool {
        self.reverse.contains_key(frame)
    }

    pub fn category_of(&self, frame: &FrameId) -> Option<Category> {
        self.reverse.get(frame).copied()
    }

    pub fn frames(&self, category: Category) -> Option<&[FrameId]> {
        self.categories.get(&category).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = (Category, &[FrameId])> {
        self.categories.iter().map(|(c, f)| (*c, f.as_slice()))
    }

    /// Variant at `position`, wrapping in both directions.
    pub fn variant(&self, category: Category, position: i128) -> Option<&FrameId> {
        let frames = self.categories.get(&category)?;
        let len = frames.len() as i128;
        if len == 0 {
            return None;
        }
        frames.get(position.rem_euclid(len) as usize)
    }

    /// First frame of `home`; the stack's root and the recovery target.
    pub fn root(&self) -> &FrameId {
        // `home` is required and non-empty after validation.
        &self.categories[&Category::Home][0]
    }

    pub fn links_from(&self, frame: &FrameId) -> &[Link] {
        self.links.get(frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn link(&self, from: &FrameId, label: &str) -> Option<&Link> {
        self.links_from(from).iter().find(|l| l.label == label)
    }

    pub fn descriptor(&self, frame: &FrameId) -> Option<&FrameDescriptor> {
        self.frames.get(frame)
    }
}
