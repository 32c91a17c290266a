//! Named stencils and resolution of shape references

use std::collections::HashMap;

use crate::errors::{Result, StencilError};
use crate::log::debug;
use crate::shapes::ShapeRef;
use crate::types::Bounds;

use super::codec::Codec;
use super::{ForegroundNode, StencilDocument};

/// Lookup of stencils by registered name (`mxgraph.flowchart.disk`, ...)
pub trait StencilRegistry {
    fn lookup(&self, name: &str) -> Option<&StencilDocument>;
}

/// In-memory registry
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    stencils: HashMap<String, StencilDocument>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, stencil: StencilDocument) {
        self.stencils.insert(name.into(), stencil);
    }

    /// Register a stencil given in its XML text form
    pub fn register_xml(&mut self, name: impl Into<String>, xml: &str) -> Result<()> {
        let stencil = StencilDocument::parse(xml)?;
        self.register(name, stencil);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }
}

impl StencilRegistry for MemoryRegistry {
    fn lookup(&self, name: &str) -> Option<&StencilDocument> {
        self.stencils.get(name)
    }
}

/// Turns any `ShapeRef` into a stencil document
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    codec: &'a dyn Codec,
    registry: &'a dyn StencilRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(codec: &'a dyn Codec, registry: &'a dyn StencilRegistry) -> Self {
        Self { codec, registry }
    }

    pub fn codec(&self) -> &'a dyn Codec {
        self.codec
    }

    /// Built-in shapes resolve to a unit document drawing them; named and
    /// embedded references fail loudly when they cannot be resolved.
    pub fn resolve(&self, shape: &ShapeRef) -> Result<StencilDocument> {
        let unit = Bounds::new(0.0, 0.0, 1.0, 1.0);
        match shape {
            ShapeRef::Rectangle => Ok(StencilDocument::single(ForegroundNode::Rect(unit))),
            ShapeRef::Ellipse => Ok(StencilDocument::single(ForegroundNode::Ellipse(unit))),
            ShapeRef::Named(name) => {
                debug!(name = %name, "resolving named stencil");
                self.registry
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| StencilError::UnknownStencil { name: name.clone() })
            }
            ShapeRef::Embedded(token) => {
                let xml = self.codec.decompress(token)?;
                StencilDocument::parse(&xml)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::stencil::Base64Codec;

    const DISK: &str = r#"<shape w="10" h="20"><foreground><ellipse x="0" y="0" w="10" h="20"/></foreground></shape>"#;

    #[test]
    fn resolves_all_reference_kinds() {
        let mut registry = MemoryRegistry::new();
        registry.register_xml("disk", DISK).unwrap();
        let resolver = Resolver::new(&Base64Codec, &registry);

        let named = resolver.resolve(&ShapeRef::Named("disk".into())).unwrap();
        assert_eq!(named.w, 10.0);

        let token = Base64Codec.compress(DISK);
        let embedded = resolver.resolve(&ShapeRef::Embedded(token)).unwrap();
        assert_eq!(embedded, named);

        let rect = resolver.resolve(&ShapeRef::Rectangle).unwrap();
        assert!(matches!(rect.foreground[0], ForegroundNode::Rect(_)));
    }

    #[test]
    fn unknown_name_fails() {
        let registry = MemoryRegistry::new();
        let resolver = Resolver::new(&Base64Codec, &registry);
        let err = resolver.resolve(&ShapeRef::Named("nope".into())).unwrap_err();
        assert!(matches!(err, StencilError::UnknownStencil { .. }));
        assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
    }
}
