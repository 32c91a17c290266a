//! Host element collection and the merge/split operations on it
//!
//! `Host` is the seam to the editor's element store. `Diagram` is a plain
//! in-memory host with nested update brackets and a change log.
//! `ShapeCreator` runs the compiler and decompiler against a host, doing
//! every fallible step before the update bracket opens so a failure leaves
//! the host untouched.

use std::collections::BTreeMap;

use crate::compile::hit_test::HitTest;
use crate::compile::{BackgroundPolicy, Compiler, MergeMode};
use crate::config::{CompileOptions, DecompileOptions};
use crate::decompile::Decompiler;
use crate::errors::{Result, StencilError};
use crate::log::{debug, warn};
use crate::shapes::{ConstraintMarker, PathGroupShape, PrimitiveShape, Shape, ShapeRef, SubStencilShape};
use crate::stencil::{Codec, Resolver, StencilRegistry};
use crate::types::Bounds;

pub type CellId = usize;

/// One element of the host collection
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Primitive(PrimitiveShape),
    /// Standalone constraint marker, geometry in diagram space
    Marker(ConstraintMarker),
    /// An element drawn by a stencil given in its style
    Stencil { geometry: Bounds, style: String },
    /// Grouped cells. A group of edges merges as one continuous path.
    Group { children: Vec<CellId> },
}

/// Element collection with a transaction boundary
pub trait Host {
    fn begin_update(&mut self);

    fn end_update(&mut self);

    fn insert(&mut self, cell: Cell) -> CellId;

    fn remove(&mut self, id: CellId) -> Option<Cell>;

    fn get(&self, id: CellId) -> Option<&Cell>;

    /// Group existing cells under a new group cell
    fn group(&mut self, children: Vec<CellId>) -> CellId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Inserted(CellId),
    Removed(CellId),
}

/// In-memory host.
///
/// Changes made inside an update bracket are collected and committed as one
/// batch when the outermost bracket closes.
#[derive(Debug, Default)]
pub struct Diagram {
    cells: BTreeMap<CellId, Cell>,
    next_id: CellId,
    update_level: usize,
    pending: Vec<Change>,
    history: Vec<Vec<Change>>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// Committed batches, oldest first
    pub fn history(&self) -> &[Vec<Change>] {
        &self.history
    }

    pub fn in_update(&self) -> bool {
        self.update_level > 0
    }

    fn record(&mut self, change: Change) {
        if self.update_level > 0 {
            self.pending.push(change);
        } else {
            self.history.push(vec![change]);
        }
    }
}

impl Host for Diagram {
    fn begin_update(&mut self) {
        self.update_level += 1;
    }

    fn end_update(&mut self) {
        if self.update_level == 0 {
            warn!("end_update without matching begin_update");
            return;
        }
        self.update_level -= 1;
        if self.update_level == 0 && !self.pending.is_empty() {
            let batch = std::mem::take(&mut self.pending);
            debug!(changes = batch.len(), "committed update");
            self.history.push(batch);
        }
    }

    fn insert(&mut self, cell: Cell) -> CellId {
        let id = self.next_id;
        self.next_id += 1;
        self.cells.insert(id, cell);
        self.record(Change::Inserted(id));
        id
    }

    fn remove(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.cells.remove(&id)?;
        self.record(Change::Removed(id));
        Some(cell)
    }

    fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    fn group(&mut self, children: Vec<CellId>) -> CellId {
        self.insert(Cell::Group { children })
    }
}

/// Result of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merged {
    /// The new stencil element
    pub stencil: CellId,
    /// Group of the stencil and the selection's texts, when there were texts
    pub group: Option<CellId>,
}

/// Merges host elements into stencils and splits them back
pub struct ShapeCreator<'a> {
    codec: &'a dyn Codec,
    registry: &'a dyn StencilRegistry,
    hit_test: &'a dyn HitTest,
    compile_options: CompileOptions,
    decompile_options: DecompileOptions,
}

impl<'a> ShapeCreator<'a> {
    pub fn new(codec: &'a dyn Codec, registry: &'a dyn StencilRegistry, hit_test: &'a dyn HitTest) -> Self {
        Self {
            codec,
            registry,
            hit_test,
            compile_options: CompileOptions::default(),
            decompile_options: DecompileOptions::default(),
        }
    }

    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile_options = options;
        self
    }

    pub fn with_decompile_options(mut self, options: DecompileOptions) -> Self {
        self.decompile_options = options;
        self
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.codec, self.registry)
    }

    /// Replace `selection` with one stencil element.
    ///
    /// Texts in the selection stay as they are and are grouped with the new
    /// element. A selected group must hold only edges; they are drawn as one
    /// stitched path and the group goes away with its children. Nothing in
    /// `host` changes unless the whole merge succeeds.
    pub fn merge<H: Host>(
        &self,
        host: &mut H,
        selection: &[CellId],
        policy: BackgroundPolicy,
        mode: MergeMode,
    ) -> Result<Merged> {
        let mut primitives = Vec::with_capacity(selection.len());
        let mut texts = Vec::new();
        let mut consumed = Vec::new();
        for &id in selection {
            let shape = match host.get(id) {
                None => return Err(StencilError::UnknownCell { id }),
                Some(Cell::Primitive(shape)) => shape.clone(),
                Some(Cell::Stencil { geometry, style }) => {
                    let shape = ShapeRef::from_style(style).ok_or(StencilError::NotAStencil { id })?;
                    SubStencilShape::new(shape, *geometry).into()
                }
                Some(Cell::Group { children }) => {
                    let members = children
                        .iter()
                        .map(|&child| match host.get(child) {
                            Some(Cell::Primitive(shape)) if shape.edge().is_some() => Ok(shape.clone()),
                            Some(_) => Err(StencilError::UnsupportedCell { id: child }),
                            None => Err(StencilError::UnknownCell { id: child }),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let group = PathGroupShape::from_members(&members)
                        .ok_or(StencilError::UnsupportedCell { id })?;
                    consumed.extend(children.iter().copied());
                    group.into()
                }
                Some(Cell::Marker(_)) => return Err(StencilError::UnsupportedCell { id }),
            };
            if shape.is_text() {
                texts.push(id);
            } else {
                consumed.push(id);
            }
            primitives.push(shape);
        }

        let compiled = Compiler::new(self.resolver(), self.hit_test)
            .with_options(self.compile_options)
            .compile(&primitives, policy, mode)?;
        let style = compiled.style(self.codec)?;

        host.begin_update();
        let stencil = host.insert(Cell::Stencil {
            geometry: compiled.bounds,
            style,
        });
        for id in &consumed {
            host.remove(*id);
        }
        let group = if texts.is_empty() {
            None
        } else {
            let mut children = vec![stencil];
            children.extend(&texts);
            Some(host.group(children))
        };
        host.end_update();

        debug!(stencil, merged = consumed.len(), texts = texts.len(), "merged selection");
        Ok(Merged { stencil, group })
    }

    /// Replace a stencil element with the primitives and markers it decompiles to
    pub fn split<H: Host>(&self, host: &mut H, id: CellId) -> Result<Vec<CellId>> {
        let (shape, geometry) = match host.get(id) {
            None => return Err(StencilError::UnknownCell { id }),
            Some(Cell::Stencil { geometry, style }) => {
                let shape = ShapeRef::from_style(style).ok_or(StencilError::NotAStencil { id })?;
                (shape, *geometry)
            }
            Some(_) => return Err(StencilError::NotAStencil { id }),
        };

        let decompiled = Decompiler::new(self.resolver())
            .with_options(self.decompile_options)
            .decompile(&shape, &geometry)?;

        host.begin_update();
        let mut inserted = Vec::with_capacity(decompiled.primitives.len() + decompiled.markers.len());
        for primitive in decompiled.primitives {
            inserted.push(host.insert(Cell::Primitive(primitive)));
        }
        for marker in decompiled.markers {
            inserted.push(host.insert(Cell::Marker(marker)));
        }
        host.remove(id);
        host.end_update();

        debug!(stencil = id, inserted = inserted.len(), "split stencil");
        Ok(inserted)
    }
}
