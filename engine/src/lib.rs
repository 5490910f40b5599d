pub mod algo;
pub mod tree;
pub mod utils;

use rayon::prelude::*;
use rst_common::db::core::NetDB;
use rst_common::db::indices::{NetId, PinId};
use rst_common::util::config::SteinerConfig;
use rst_common::util::profiler::PassTimer;
use tree::STree;

/// Builds the routing topology for one net: Prim-Dijkstra
/// construction, then edge flipping, then HVW steinerisation.
///
/// `skip` lets the caller veto individual pins. A net whose driver is
/// absent or vetoed yields an empty tree.
pub fn build_net<F>(
    db: &NetDB,
    net: NetId,
    config: &SteinerConfig,
    skip: F,
) -> Result<STree, String>
where
    F: FnMut(PinId) -> bool,
{
    let alpha = config.alpha;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(format!("alpha must be in [0, 1], got {}", alpha));
    }

    let name = &db.nets[net.index()].name;
    let _timer = PassTimer::new("steiner build");
    let mut tree = STree::init_nodes(db, net, skip);
    if tree.is_empty() {
        log::debug!("net '{}' has no driver, skipping", name);
        return Ok(tree);
    }

    algo::prim_dijkstra::run(&mut tree, alpha);
    let moves = algo::edge_flip::run(&mut tree, alpha, config.flip_move_limit);
    let steiners = algo::hvw::run(&mut tree).map_err(|e| format!("net '{}': {}", name, e))?;

    log::debug!(
        "net '{}': {} nodes, {} flips, {} steiner points, wirelength {}",
        name,
        tree.nodes.len(),
        moves,
        steiners,
        tree.total_wire_length()
    );
    Ok(tree)
}

/// Builds every net in the database, in net order. Nets are
/// independent (each owns its tree), so they run in parallel.
pub fn build_all(db: &NetDB, config: &SteinerConfig) -> Result<Vec<STree>, String> {
    (0..db.num_nets())
        .into_par_iter()
        .map(|i| build_net(db, NetId::new(i), config, |_| false))
        .collect()
}
