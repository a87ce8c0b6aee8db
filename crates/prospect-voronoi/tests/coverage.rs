use proptest::prelude::*;
use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};
use prospect_voronoi::{Partition, PartitionPolicy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn arb_edge() -> impl Strategy<Value = EdgeBehavior> {
    prop_oneof![Just(EdgeBehavior::Clamp), Just(EdgeBehavior::Wrap)]
}

fn arb_policy() -> impl Strategy<Value = PartitionPolicy> {
    proptest::sample::select(PartitionPolicy::ALL.to_vec())
}

proptest! {
    #[test]
    fn every_cell_maps_to_a_site(
        w in 1u32..12,
        h in 1u32..12,
        edge in arb_edge(),
        policy in arb_policy(),
        raw in proptest::collection::vec((0i32..12, 0i32..12), 1..6),
    ) {
        let g = Graph::uniform(w, h, 1.0, edge, Terrain::Grass).unwrap();
        let sites: Vec<Coordinate> = raw.into_iter().map(|(x, y)| g.resolve(Coordinate::new(x, y))).collect();
        let mut p = policy.build();
        p.generate(&g, &sites);

        for s in p.sites() {
            prop_assert_eq!(p.closest_to(*s), *s, "{} site {}", policy, s);
        }
        for cell in g.cells() {
            let owner = p.closest_to(cell);
            let is_site = p.sites().contains(&owner);
            // Half-plane cells fall back to the cell itself when rounding leaves it unclaimed.
            prop_assert!(is_site || (policy == PartitionPolicy::BisectorPlanes && owner == cell));
        }
    }
}

#[test]
fn seeded_sites_partition_deterministically() {
    let g = Graph::uniform(32, 32, 1.0, EdgeBehavior::Wrap, Terrain::Grass).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let sites: Vec<Coordinate> = (0..8)
        .map(|_| Coordinate::new(rng.gen_range(0..32), rng.gen_range(0..32)))
        .collect();

    let mut a = PartitionPolicy::ToroidalEuclidean.build();
    let mut b = PartitionPolicy::ToroidalEuclidean.build();
    a.generate(&g, &sites);
    b.generate(&g, &sites);
    for cell in g.cells() {
        assert_eq!(a.closest_to(cell), b.closest_to(cell));
    }
}
