use super::kind_cache::KindCache;
use crate::{
    descriptor::{
        AddDescriptor, DiffuseDescriptor, EmissionDescriptor, GlassDescriptor, GlossyDescriptor,
        HoldoutDescriptor, MaterialDescriptor, MixDescriptor, NodeGraphDescriptor,
        PlaceholderDescriptor, PrincipledDescriptor, TranslucentDescriptor,
        TransparentDescriptor, VolumeAbsorptionDescriptor, VolumeScatterDescriptor,
    },
    host::MaterialKind,
    renderer::ShaderIndex,
};

/// One independent cache per material kind.
///
/// Multi and Background have none: the first never becomes a shader, the
/// second always overwrites the scene's background slot.
#[derive(Debug, Default)]
pub struct ShaderCaches {
    pub diffuse: KindCache<DiffuseDescriptor>,
    pub glossy: KindCache<GlossyDescriptor>,
    pub glass: KindCache<GlassDescriptor>,
    pub emission: KindCache<EmissionDescriptor>,
    pub transparent: KindCache<TransparentDescriptor>,
    pub translucent: KindCache<TranslucentDescriptor>,
    pub principled: KindCache<PrincipledDescriptor>,
    pub holdout: KindCache<HoldoutDescriptor>,
    pub volume_absorption: KindCache<VolumeAbsorptionDescriptor>,
    pub volume_scatter: KindCache<VolumeScatterDescriptor>,
    pub add: KindCache<AddDescriptor>,
    pub mix: KindCache<MixDescriptor>,
    pub node_graph: KindCache<NodeGraphDescriptor>,
    pub placeholder: KindCache<PlaceholderDescriptor>,
}

impl ShaderCaches {
    pub fn lookup(&self, desc: &MaterialDescriptor) -> Option<ShaderIndex> {
        match desc {
            MaterialDescriptor::Diffuse(d) => self.diffuse.get(d),
            MaterialDescriptor::Glossy(d) => self.glossy.get(d),
            MaterialDescriptor::Glass(d) => self.glass.get(d),
            MaterialDescriptor::Emission(d) => self.emission.get(d),
            MaterialDescriptor::Transparent(d) => self.transparent.get(d),
            MaterialDescriptor::Translucent(d) => self.translucent.get(d),
            MaterialDescriptor::Principled(d) => self.principled.get(d),
            MaterialDescriptor::Holdout(d) => self.holdout.get(d),
            MaterialDescriptor::VolumeAbsorption(d) => self.volume_absorption.get(d),
            MaterialDescriptor::VolumeScatter(d) => self.volume_scatter.get(d),
            MaterialDescriptor::Add(d) => self.add.get(d),
            MaterialDescriptor::Mix(d) => self.mix.get(d),
            MaterialDescriptor::NodeGraph(d) => self.node_graph.get(d),
            MaterialDescriptor::Placeholder(d) => self.placeholder.get(d),
            MaterialDescriptor::Multi(_) | MaterialDescriptor::Background(_) => None,
        }
    }

    /// Remember `index` for `desc`. Uncached kinds are ignored.
    pub fn store(&mut self, desc: MaterialDescriptor, index: ShaderIndex) -> ShaderIndex {
        match desc {
            MaterialDescriptor::Diffuse(d) => self.diffuse.insert(d, index),
            MaterialDescriptor::Glossy(d) => self.glossy.insert(d, index),
            MaterialDescriptor::Glass(d) => self.glass.insert(d, index),
            MaterialDescriptor::Emission(d) => self.emission.insert(d, index),
            MaterialDescriptor::Transparent(d) => self.transparent.insert(d, index),
            MaterialDescriptor::Translucent(d) => self.translucent.insert(d, index),
            MaterialDescriptor::Principled(d) => self.principled.insert(d, index),
            MaterialDescriptor::Holdout(d) => self.holdout.insert(d, index),
            MaterialDescriptor::VolumeAbsorption(d) => self.volume_absorption.insert(d, index),
            MaterialDescriptor::VolumeScatter(d) => self.volume_scatter.insert(d, index),
            MaterialDescriptor::Add(d) => self.add.insert(d, index),
            MaterialDescriptor::Mix(d) => self.mix.insert(d, index),
            MaterialDescriptor::NodeGraph(d) => self.node_graph.insert(d, index),
            MaterialDescriptor::Placeholder(d) => self.placeholder.insert(d, index),
            MaterialDescriptor::Multi(_) | MaterialDescriptor::Background(_) => index,
        }
    }

    /// Number of distinct descriptors remembered for `kind`.
    pub fn len(&self, kind: MaterialKind) -> usize {
        match kind {
            MaterialKind::Diffuse => self.diffuse.len(),
            MaterialKind::Glossy => self.glossy.len(),
            MaterialKind::Glass => self.glass.len(),
            MaterialKind::Emission => self.emission.len(),
            MaterialKind::Transparent => self.transparent.len(),
            MaterialKind::Translucent => self.translucent.len(),
            MaterialKind::Principled => self.principled.len(),
            MaterialKind::Holdout => self.holdout.len(),
            MaterialKind::VolumeAbsorption => self.volume_absorption.len(),
            MaterialKind::VolumeScatter => self.volume_scatter.len(),
            MaterialKind::Add => self.add.len(),
            MaterialKind::Mix => self.mix.len(),
            MaterialKind::NodeGraph => self.node_graph.len(),
            MaterialKind::Placeholder => self.placeholder.len(),
            MaterialKind::Multi | MaterialKind::Background => 0,
        }
    }
}
