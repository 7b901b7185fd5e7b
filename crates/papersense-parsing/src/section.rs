//! Section tree built from font-size hierarchy.
//!
//! Sections live in an arena and refer to each other by [`SectionId`]. The
//! root is a synthetic section with an empty heading and infinite size, so
//! every real section has a parent.

/// Index of a section inside its [`SectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

/// How a section came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Root,
    /// Placed by comparing its font size with the current section.
    Size,
    /// Forced under the override anchor by a keyword heading.
    Override,
    /// Created while post-processing the tree.
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct SectionNode {
    /// Text of the run that opened the section.
    pub heading: String,
    /// Same-size runs that followed the heading.
    pub body: String,
    pub font_size: f32,
    pub origin: Origin,
    pub parent: Option<SectionId>,
    pub children: Vec<SectionId>,
}

impl SectionNode {
    /// Heading and body joined.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.heading.clone()
        } else if self.heading.is_empty() {
            self.body.clone()
        } else {
            format!("{} {}", self.heading, self.body)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionTree {
    nodes: Vec<SectionNode>,
}

impl Default for SectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![SectionNode {
                heading: String::new(),
                body: String::new(),
                font_size: f32::INFINITY,
                origin: Origin::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> SectionId {
        SectionId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: SectionId) -> &SectionNode {
        &self.nodes[id.0]
    }

    pub fn heading(&self, id: SectionId) -> &str {
        &self.nodes[id.0].heading
    }

    pub fn children(&self, id: SectionId) -> &[SectionId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: SectionId) -> Option<SectionId> {
        self.nodes[id.0].parent
    }

    pub fn last_child(&self, id: SectionId) -> Option<SectionId> {
        self.nodes[id.0].children.last().copied()
    }

    /// All section ids except the root, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        (1..self.nodes.len()).map(SectionId)
    }

    pub fn ancestors(&self, id: SectionId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    pub fn add_child(
        &mut self,
        parent: SectionId,
        heading: &str,
        font_size: f32,
        origin: Origin,
    ) -> SectionId {
        let id = SectionId(self.nodes.len());
        self.nodes.push(SectionNode {
            heading: heading.to_string(),
            body: String::new(),
            font_size,
            origin,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Insert a new child of `parent` at `position` among its children.
    pub fn insert_child(
        &mut self,
        parent: SectionId,
        position: usize,
        heading: &str,
        font_size: f32,
        origin: Origin,
    ) -> SectionId {
        let id = self.add_child(parent, heading, font_size, origin);
        let children = &mut self.nodes[parent.0].children;
        children.pop();
        children.insert(position.min(children.len()), id);
        id
    }

    /// Append a same-size run to a section.
    pub fn extend(&mut self, id: SectionId, text: &str) {
        let body = &mut self.nodes[id.0].body;
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(text);
    }

    /// Walk up from `from` while the current section is not larger than
    /// `font_size`, then add the new section as a child of the first larger
    /// ancestor.
    pub fn backtrack_add(&mut self, from: SectionId, heading: &str, font_size: f32) -> SectionId {
        let mut current = from;
        while self.nodes[current.0].font_size <= font_size {
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.add_child(current, heading, font_size, Origin::Size)
    }

    /// Detach `id` from its parent and append it to `new_parent`'s children.
    pub fn reparent(&mut self, id: SectionId, new_parent: SectionId) {
        if let Some(old) = self.nodes[id.0].parent {
            self.nodes[old.0].children.retain(|c| *c != id);
        }
        self.nodes[id.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(id);
    }

    /// Follow the last child `depth` times from the root. Stops early at the
    /// deepest node that exists.
    pub fn last_child_path(&self, depth: usize) -> SectionId {
        let mut current = self.root();
        for _ in 0..depth {
            match self.last_child(current) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Text of a section and all its descendants: own text on the first
    /// line, each child's contents separated by blank lines.
    pub fn contents(&self, id: SectionId) -> String {
        let mut parts = vec![self.nodes[id.0].full_text()];
        parts.extend(self.children(id).iter().map(|&c| self.contents(c)));
        parts.retain(|p| !p.is_empty());
        parts.join("\n\n")
    }

    /// Contents of a section without its heading.
    pub fn body_contents(&self, id: SectionId) -> String {
        let mut parts = vec![self.nodes[id.0].body.clone()];
        parts.extend(self.children(id).iter().map(|&c| self.contents(c)));
        parts.retain(|p| !p.is_empty());
        parts.join("\n\n")
    }
}

pub struct Ancestors<'a> {
    tree: &'a SectionTree,
    next: Option<SectionId>,
}

impl Iterator for Ancestors<'_> {
    type Item = SectionId;

    fn next(&mut self) -> Option<SectionId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
