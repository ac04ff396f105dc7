//! Operator context initialization: construct the operator, wire source
//! products, inject parameters and materialize the target product with
//! lazily computed band images.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};

use lru::LruCache;

use crate::error::OperatorError;
use crate::model::graph::Node;
use crate::model::raster::{
    default_tile_size, Band, Product, ProductLayout, Raster, Rect, TileComputer, TileImage,
};
use crate::operator::{
    inject_parameters, OperatorCapabilities, OperatorRegistry, SharedOperator,
};

/// Tile sets kept alive for compute-all-bands co-population.
const ALL_BANDS_TILE_CACHE_SIZE: usize = 16;

/// Build a fully wired operator and its target product for one node.
pub(crate) fn init_operator_context(
    registry: &OperatorRegistry,
    node: &Node,
    source_products: &[(String, Arc<Product>)],
) -> Result<(SharedOperator, Arc<Product>, OperatorCapabilities), OperatorError> {
    let mut operator = registry.create_operator(&node.operator_name)?;
    for (slot, product) in source_products {
        operator.set_source_product(slot, Arc::clone(product))?;
    }
    inject_parameters(operator.as_mut(), node.configuration.as_ref())?;
    let layout = operator.initialize()?;
    let capabilities = operator.capabilities();

    let operator: SharedOperator = Arc::new(RwLock::new(operator));
    let product = build_target_product(&operator, &layout, capabilities);
    Ok((operator, product, capabilities))
}

fn build_target_product(
    operator: &SharedOperator,
    layout: &ProductLayout,
    capabilities: OperatorCapabilities,
) -> Arc<Product> {
    let tile_size = layout.tile_size.unwrap_or_else(default_tile_size);
    let make_image = |computer: Arc<dyn TileComputer>| {
        TileImage::with_tile_size(layout.scene_width, layout.scene_height, tile_size, computer)
    };

    let bands = if capabilities.computes_all_bands {
        let state = Arc::new(AllBandsState {
            operator: Arc::clone(operator),
            tiles: Mutex::new(LruCache::new(
                NonZeroUsize::new(ALL_BANDS_TILE_CACHE_SIZE)
                    .expect("ALL_BANDS_TILE_CACHE_SIZE must be > 0"),
            )),
        });
        layout
            .band_names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let computer = Arc::new(AllBandsComputer {
                    state: Arc::clone(&state),
                    band_index: index,
                });
                Band::new(name, index, make_image(computer))
            })
            .collect()
    } else {
        layout
            .band_names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let computer = Arc::new(BandComputer {
                    operator: Arc::clone(operator),
                    band_index: index,
                });
                Band::new(name, index, make_image(computer))
            })
            .collect()
    };

    Arc::new(Product::new(
        layout.name.clone(),
        layout.scene_width,
        layout.scene_height,
        bands,
    ))
}

/// Per-band bridge into `Operator::compute_tile`.
struct BandComputer {
    operator: SharedOperator,
    band_index: usize,
}

impl TileComputer for BandComputer {
    fn compute(&self, _tile_x: usize, _tile_y: usize, rect: Rect) -> Result<Raster, OperatorError> {
        self.operator.read().unwrap().compute_tile(self.band_index, rect)
    }
}

/// Shared per-product state for compute-all-bands operators: one
/// `compute_all_bands` call fills the tile for every band, and sibling
/// band requests are served from the shared tile set.
struct AllBandsState {
    operator: SharedOperator,
    tiles: Mutex<LruCache<(usize, usize), Arc<Vec<Raster>>>>,
}

struct AllBandsComputer {
    state: Arc<AllBandsState>,
    band_index: usize,
}

impl TileComputer for AllBandsComputer {
    fn compute(&self, tile_x: usize, tile_y: usize, rect: Rect) -> Result<Raster, OperatorError> {
        let mut tiles = self.state.tiles.lock().unwrap();
        let tile_set = match tiles.get(&(tile_x, tile_y)) {
            Some(tile_set) => Arc::clone(tile_set),
            None => {
                let computed = Arc::new(self.state.operator.read().unwrap().compute_all_bands(rect)?);
                tiles.put((tile_x, tile_y), Arc::clone(&computed));
                computed
            }
        };
        tile_set
            .get(self.band_index)
            .cloned()
            .ok_or_else(|| OperatorError::other(format!("no band {} in tile set", self.band_index)))
    }
}
