use std::collections::{BTreeMap, BTreeSet};

use node_forge_shader_bridge::{
    EvalTime, MaterialDescriptor, MaterialKind, ShaderIndex, TranslationSession,
    descriptor::{DiffuseDescriptor, Distribution, GlossyDescriptor, ParamSlot, Rgb, Scalar},
    host::TextureHandle,
};
use proptest::prelude::*;

const NAMES: [&str; 3] = ["A", "B", "C"];
const GREYS: [f32; 3] = [0.0, 0.5, -0.0];

fn diffuse(name: usize, grey: usize, textured: bool) -> MaterialDescriptor {
    MaterialDescriptor::Diffuse(DiffuseDescriptor {
        name: NAMES[name].to_string(),
        color: if textured {
            ParamSlot::Texture(TextureHandle::new(grey as u64, format!("t{grey}.png")))
        } else {
            ParamSlot::Constant(Rgb::grey(GREYS[grey]))
        },
        roughness: ParamSlot::Constant(Scalar(0.0)),
        normal: None,
    })
}

fn glossy(name: usize, grey: usize) -> MaterialDescriptor {
    MaterialDescriptor::Glossy(GlossyDescriptor {
        name: NAMES[name].to_string(),
        color: ParamSlot::Constant(Rgb::grey(GREYS[grey])),
        roughness: ParamSlot::Constant(Scalar(0.2)),
        distribution: Distribution::default(),
        normal: None,
    })
}

fn descriptor() -> impl Strategy<Value = MaterialDescriptor> {
    prop_oneof![
        (0..3usize, 0..3usize, any::<bool>()).prop_map(|(n, g, t)| diffuse(n, g, t)),
        (0..3usize, 0..3usize).prop_map(|(n, g)| glossy(n, g)),
    ]
}

proptest! {
    #[test]
    fn equal_descriptors_collapse_and_distinct_ones_do_not(
        descs in prop::collection::vec(descriptor(), 1..40)
    ) {
        let mut session = TranslationSession::new(EvalTime(0));
        let mut seen: BTreeMap<MaterialDescriptor, ShaderIndex> = BTreeMap::new();

        for d in &descs {
            let index = session.get_or_build(d);
            let first = *seen.entry(d.clone()).or_insert(index);
            prop_assert_eq!(first, index);
        }

        let distinct: BTreeSet<ShaderIndex> = seen.values().copied().collect();
        prop_assert_eq!(distinct.len(), seen.len());
        prop_assert_eq!(session.builds(), seen.len());

        let diffuse = seen.keys().filter(|d| d.kind() == MaterialKind::Diffuse).count();
        prop_assert_eq!(session.cache_len(MaterialKind::Diffuse), diffuse);
    }

    #[test]
    fn resolving_again_changes_nothing(
        descs in prop::collection::vec(descriptor(), 1..20)
    ) {
        let mut session = TranslationSession::new(EvalTime(0));
        let first: Vec<ShaderIndex> = descs.iter().map(|d| session.get_or_build(d)).collect();
        let builds = session.builds();
        let shaders = session.scene().shader_count();

        let second: Vec<ShaderIndex> = descs.iter().map(|d| session.get_or_build(d)).collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(session.builds(), builds);
        prop_assert_eq!(session.scene().shader_count(), shaders);
    }
}
