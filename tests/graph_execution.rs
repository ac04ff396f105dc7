//! End-to-end graph execution tests: pipelines are declared against a
//! registry, executed tile by tile, and observed from the outside.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rastergraph::engine::{GraphContext, GraphObserver, GraphProcessor};
use rastergraph::error::{GraphError, OperatorError};
use rastergraph::model::graph::{ConfigElement, Graph, Node};
use rastergraph::model::raster::{Product, ProductLayout, Raster, Rect};
use rastergraph::operator::{
    Operator, OperatorCapabilities, OperatorPlugin, OperatorRegistry, ParamDescriptor, ParamKind,
    ParamValue,
};
use rastergraph::progress::{CancelFlag, CancelableProgress, NullProgress};

/// Shared lifecycle record for spy operators.
#[derive(Default)]
struct Stats {
    computes: Mutex<HashMap<String, usize>>,
    disposes: Mutex<Vec<String>>,
}

impl Stats {
    fn computes_of(&self, label: &str) -> usize {
        self.computes.lock().unwrap().get(label).copied().unwrap_or(0)
    }
}

/// Operator that counts tile computations and disposals per node label.
///
/// Without a source it acts as a `width` x `height` source with `bands`
/// bands (band `i` filled with `i`); with a source it copies the source
/// band through, pulling the upstream tile like any filter would.
struct SpyOperator {
    label: String,
    width: usize,
    height: usize,
    bands: usize,
    source: Option<Arc<Product>>,
    stats: Arc<Stats>,
}

impl SpyOperator {
    fn copy_source(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        let source = self.source.as_ref().expect("sourced spy");
        let band = source
            .band_at(band_index)
            .ok_or_else(|| OperatorError::other(format!("no source band {}", band_index)))?;
        let tile_size = band.image().tile_size();
        let tile = band.tile(rect.x / tile_size.width, rect.y / tile_size.height)?;
        let mut out = Raster::new(rect);
        if let Some(overlap) = rect.intersection(&tile.rect()) {
            for y in overlap.y..overlap.max_y() {
                for x in overlap.x..overlap.max_x() {
                    out.set_sample(x, y, tile.sample(x, y));
                }
            }
        }
        Ok(out)
    }
}

impl Operator for SpyOperator {
    fn set_source_product(
        &mut self,
        _slot: &str,
        product: Arc<Product>,
    ) -> Result<(), OperatorError> {
        self.source = Some(product);
        Ok(())
    }

    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        let (width, height, bands) = match &self.source {
            Some(source) => (
                source.scene_width(),
                source.scene_height(),
                source.band_count(),
            ),
            None => (self.width, self.height, self.bands),
        };
        let band_names = (0..bands).map(|i| format!("band_{}", i)).collect();
        Ok(ProductLayout::new(self.label.clone(), width, height).with_bands(band_names))
    }

    fn compute_tile(&self, band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        *self
            .stats
            .computes
            .lock()
            .unwrap()
            .entry(self.label.clone())
            .or_insert(0) += 1;
        match &self.source {
            Some(_) => self.copy_source(band_index, rect),
            None => Ok(Raster::filled(rect, band_index as f32)),
        }
    }

    fn parameters(&self) -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::new("label", "Label", ParamKind::Text, ParamValue::Text(String::new())),
            ParamDescriptor::new(
                "width",
                "Width",
                ParamKind::Integer { min: 0, max: 1 << 20 },
                ParamValue::Integer(100),
            ),
            ParamDescriptor::new(
                "height",
                "Height",
                ParamKind::Integer { min: 0, max: 1 << 20 },
                ParamValue::Integer(100),
            ),
            ParamDescriptor::new(
                "bands",
                "Bands",
                ParamKind::Integer { min: 1, max: 64 },
                ParamValue::Integer(1),
            ),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), OperatorError> {
        match name {
            "label" => self.label = value.as_str().unwrap_or_default().to_string(),
            "width" => self.width = value.as_i64().unwrap_or(100) as usize,
            "height" => self.height = value.as_i64().unwrap_or(100) as usize,
            "bands" => self.bands = value.as_i64().unwrap_or(1) as usize,
            _ => return Err(OperatorError::invalid_parameter(name, "not recognized")),
        }
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), OperatorError> {
        self.stats.disposes.lock().unwrap().push(self.label.clone());
        Ok(())
    }
}

struct SpyPlugin {
    stats: Arc<Stats>,
}

impl OperatorPlugin for SpyPlugin {
    fn id(&self) -> &'static str {
        "spy"
    }

    fn name(&self) -> String {
        "Spy".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(SpyOperator {
            label: String::new(),
            width: 100,
            height: 100,
            bands: 1,
            source: None,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// Sourceless operator with the compute-all-bands capability; counts how
/// often each entry point is used.
struct AllBandsSpyOperator {
    bands: usize,
    stats: Arc<Stats>,
}

impl Operator for AllBandsSpyOperator {
    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        let band_names = (0..self.bands).map(|i| format!("band_{}", i)).collect();
        Ok(ProductLayout::new("all_bands", 100, 100).with_bands(band_names))
    }

    fn compute_tile(&self, _band_index: usize, rect: Rect) -> Result<Raster, OperatorError> {
        *self
            .stats
            .computes
            .lock()
            .unwrap()
            .entry("per_band".to_string())
            .or_insert(0) += 1;
        Ok(Raster::new(rect))
    }

    fn compute_all_bands(&self, rect: Rect) -> Result<Vec<Raster>, OperatorError> {
        *self
            .stats
            .computes
            .lock()
            .unwrap()
            .entry("all_bands".to_string())
            .or_insert(0) += 1;
        Ok((0..self.bands)
            .map(|i| Raster::filled(rect, i as f32))
            .collect())
    }

    fn capabilities(&self) -> OperatorCapabilities {
        OperatorCapabilities {
            computes_all_bands: true,
            custom_parameter_conversion: false,
        }
    }
}

struct AllBandsSpyPlugin {
    stats: Arc<Stats>,
}

impl OperatorPlugin for AllBandsSpyPlugin {
    fn id(&self) -> &'static str {
        "all_bands_spy"
    }

    fn name(&self) -> String {
        "All-bands spy".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(AllBandsSpyOperator {
            bands: 3,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// Source operator whose tile computation always fails.
struct FailingOperator;

impl Operator for FailingOperator {
    fn initialize(&mut self) -> Result<ProductLayout, OperatorError> {
        Ok(ProductLayout::new("failing", 100, 100).with_bands(vec!["b".to_string()]))
    }

    fn compute_tile(&self, _band_index: usize, _rect: Rect) -> Result<Raster, OperatorError> {
        Err(OperatorError::other("sensor dropout"))
    }
}

struct FailingPlugin;

impl OperatorPlugin for FailingPlugin {
    fn id(&self) -> &'static str {
        "failing"
    }

    fn name(&self) -> String {
        "Failing source".to_string()
    }

    fn create_operator(&self) -> Box<dyn Operator> {
        Box::new(FailingOperator)
    }
}

/// Observer recording every event as a readable line.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
    cancel_on_tile_stop: Option<CancelFlag>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl GraphObserver for RecordingObserver {
    fn graph_processing_started(&self, _context: &GraphContext) {
        self.events.lock().unwrap().push("started".to_string());
    }

    fn tile_processing_started(&self, _context: &GraphContext, tile_rect: Rect) {
        self.events
            .lock()
            .unwrap()
            .push(format!("tile_started:{},{}", tile_rect.x, tile_rect.y));
    }

    fn tile_processing_stopped(&self, _context: &GraphContext, tile_rect: Rect) {
        self.events
            .lock()
            .unwrap()
            .push(format!("tile_stopped:{},{}", tile_rect.x, tile_rect.y));
        if let Some(flag) = &self.cancel_on_tile_stop {
            flag.cancel();
        }
    }

    fn graph_processing_stopped(&self, _context: &GraphContext) {
        self.events.lock().unwrap().push("stopped".to_string());
    }
}

struct Fixture {
    processor: GraphProcessor,
    stats: Arc<Stats>,
    observer: Arc<RecordingObserver>,
}

fn fixture_with(observer: RecordingObserver) -> Fixture {
    let stats = Arc::new(Stats::default());
    let registry = OperatorRegistry::default();
    registry.register(Arc::new(SpyPlugin {
        stats: Arc::clone(&stats),
    }));
    registry.register(Arc::new(AllBandsSpyPlugin {
        stats: Arc::clone(&stats),
    }));
    registry.register(Arc::new(FailingPlugin));

    let observer = Arc::new(observer);
    let mut processor = GraphProcessor::new(Arc::new(registry));
    processor.add_observer(Arc::clone(&observer) as Arc<dyn GraphObserver>);
    Fixture {
        processor,
        stats,
        observer,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingObserver::default())
}

fn spy_node(id: &str, width: usize, height: usize) -> Node {
    Node::new(id, "spy").with_configuration(
        ConfigElement::new("parameters")
            .with_leaf("label", id)
            .with_leaf("width", width.to_string())
            .with_leaf("height", height.to_string()),
    )
}

fn spy_sink(id: &str, source: &str) -> Node {
    Node::new(id, "spy")
        .with_source("input", source)
        .with_configuration(ConfigElement::new("parameters").with_leaf("label", id))
}

#[test]
fn test_linear_chain_read_filter_write() {
    let f = fixture();

    // constant -> gain -> spy sink, 100x100 scene on the default 64x64
    // tile grid: a 2x2 tile schedule.
    let mut graph = Graph::new("chain");
    graph
        .add_node(
            Node::new("read", "constant").with_configuration(
                ConfigElement::new("parameters")
                    .with_leaf("width", "100")
                    .with_leaf("height", "100")
                    .with_leaf("value", "1.0"),
            ),
        )
        .unwrap();
    graph
        .add_node(
            Node::new("filter", "gain")
                .with_source("input", "read")
                .with_configuration(
                    ConfigElement::new("parameters")
                        .with_leaf("gain", "2.0")
                        .with_leaf("offset", "0.5"),
                ),
        )
        .unwrap();
    graph.add_node(spy_sink("write", "filter")).unwrap();

    let context = f
        .processor
        .create_graph_context(graph, &mut NullProgress)
        .unwrap();

    let outputs: Vec<&str> = context.output_contexts().map(|c| c.node_id()).collect();
    assert_eq!(outputs, vec!["write"]);

    f.processor
        .execute_graph_context(&context, &mut NullProgress)
        .unwrap();

    // The scheduler visited the sink on all four tiles; upstream nodes
    // were pulled through recursion, not scheduled directly.
    assert_eq!(f.stats.computes_of("write"), 4);

    // 2.0 * 1.0 + 0.5 flowed through to the sink.
    let product = context
        .node_context("write")
        .unwrap()
        .target_product()
        .unwrap();
    let tile = product.band_at(0).unwrap().tile(1, 1).unwrap();
    assert_eq!(tile.rect(), Rect::new(64, 64, 36, 36));
    assert_eq!(tile.sample(99, 99), 2.5);

    // Row-major tile order, started/stopped pairs, framed by graph events.
    assert_eq!(
        f.observer.events(),
        vec![
            "started",
            "tile_started:0,0",
            "tile_stopped:0,0",
            "tile_started:64,0",
            "tile_stopped:64,0",
            "tile_started:0,64",
            "tile_stopped:0,64",
            "tile_started:64,64",
            "tile_stopped:64,64",
            "stopped",
        ]
    );
}

#[test]
fn test_diamond_reference_counts_and_merge_output() {
    let f = fixture();

    let mut graph = Graph::new("diamond");
    graph
        .add_node(
            Node::new("read", "constant").with_configuration(
                ConfigElement::new("parameters")
                    .with_leaf("width", "100")
                    .with_leaf("height", "100")
                    .with_leaf("value", "3.0"),
            ),
        )
        .unwrap();
    graph
        .add_node(
            Node::new("a", "gain")
                .with_source("input", "read")
                .with_configuration(ConfigElement::new("parameters").with_leaf("gain", "2.0")),
        )
        .unwrap();
    graph
        .add_node(
            Node::new("b", "gain")
                .with_source("input", "read")
                .with_configuration(ConfigElement::new("parameters").with_leaf("offset", "1.0")),
        )
        .unwrap();
    graph
        .add_node(
            Node::new("merge", "merge")
                .with_source("left", "a")
                .with_source("right", "b"),
        )
        .unwrap();

    let context = f
        .processor
        .create_graph_context(graph, &mut NullProgress)
        .unwrap();

    assert_eq!(context.node_context("read").unwrap().reference_count(), 2);
    let outputs: Vec<&str> = context.output_contexts().map(|c| c.node_id()).collect();
    assert_eq!(outputs, vec!["merge"]);

    f.processor
        .execute_graph_context(&context, &mut NullProgress)
        .unwrap();

    let product = context
        .node_context("merge")
        .unwrap()
        .target_product()
        .unwrap();
    assert_eq!(product.band_count(), 2);
    // left band: 2 * 3, right band: 3 + 1
    assert_eq!(product.band_at(0).unwrap().tile(0, 0).unwrap().sample(0, 0), 6.0);
    assert_eq!(product.band_at(1).unwrap().tile(0, 0).unwrap().sample(0, 0), 4.0);
}

#[test]
fn test_missing_source_fails_validation() {
    let f = fixture();
    let mut graph = Graph::new("broken");
    graph
        .add_node(Node::new("x", "spy").with_source("input", "missing"))
        .unwrap();

    let result = f.processor.create_graph_context(graph, &mut NullProgress);
    assert!(matches!(
        result,
        Err(GraphError::MissingSource { node_id, source_id })
            if node_id == "x" && source_id == "missing"
    ));
}

#[test]
fn test_cancellation_stops_tiles_and_still_disposes() {
    let flag = CancelFlag::new();
    let f = fixture_with(RecordingObserver {
        cancel_on_tile_stop: Some(flag.clone()),
        ..Default::default()
    });

    let mut graph = Graph::new("cancel");
    graph.add_node(spy_node("out", 100, 100)).unwrap();

    let mut pm = CancelableProgress::new(flag);
    f.processor.execute_graph(graph, &mut pm).unwrap();

    // Tile (0,0) completed; the cancel flag was observed before (64,0).
    assert_eq!(
        f.observer.events(),
        vec!["started", "tile_started:0,0", "tile_stopped:0,0", "stopped"]
    );
    assert_eq!(f.stats.computes_of("out"), 1);
    assert_eq!(*f.stats.disposes.lock().unwrap(), vec!["out".to_string()]);
}

#[test]
fn test_outputs_of_different_sizes_share_the_grid() {
    let f = fixture();

    let mut graph = Graph::new("two_outputs");
    graph.add_node(spy_node("large", 100, 100)).unwrap();
    graph.add_node(spy_node("small", 50, 50)).unwrap();

    let context = f
        .processor
        .create_graph_context(graph, &mut NullProgress)
        .unwrap();
    f.processor
        .execute_graph_context(&context, &mut NullProgress)
        .unwrap();

    // Union is 100x100: four tiles. The 50x50 product only overlaps the
    // first one; the bounds check skips it elsewhere.
    assert_eq!(f.stats.computes_of("large"), 4);
    assert_eq!(f.stats.computes_of("small"), 1);
}

#[test]
fn test_compute_all_bands_pulls_one_band_per_tile() {
    let f = fixture();

    let mut graph = Graph::new("all_bands");
    graph.add_node(Node::new("out", "all_bands_spy")).unwrap();

    let context = f
        .processor
        .create_graph_context(graph, &mut NullProgress)
        .unwrap();
    f.processor
        .execute_graph_context(&context, &mut NullProgress)
        .unwrap();

    // One all-bands computation per tile, never the per-band entry point.
    assert_eq!(f.stats.computes_of("all_bands"), 4);
    assert_eq!(f.stats.computes_of("per_band"), 0);

    // Sibling bands of a computed tile are served from the shared set.
    let product = context.node_context("out").unwrap().target_product().unwrap();
    assert_eq!(product.band_at(2).unwrap().tile(0, 0).unwrap().sample(0, 0), 2.0);
    assert_eq!(f.stats.computes_of("all_bands"), 4);
}

#[test]
fn test_zero_size_union_fires_no_tiles() {
    let f = fixture();

    let mut graph = Graph::new("empty_union");
    graph.add_node(spy_node("out", 0, 100)).unwrap();

    f.processor.execute_graph(graph, &mut NullProgress).unwrap();

    assert_eq!(f.observer.events(), vec!["started", "stopped"]);
    assert_eq!(f.stats.computes_of("out"), 0);
}

#[test]
fn test_missing_configuration_keeps_defaults() {
    let f = fixture();

    let mut graph = Graph::new("defaults");
    graph.add_node(Node::new("out", "spy")).unwrap();

    let context = f
        .processor
        .create_graph_context(graph, &mut NullProgress)
        .unwrap();
    let product = context.node_context("out").unwrap().target_product().unwrap();
    assert_eq!(product.scene_width(), 100);
    assert_eq!(product.scene_height(), 100);
}

#[test]
fn test_tile_failure_aborts_but_notifies_and_disposes() {
    let f = fixture();

    let mut graph = Graph::new("failing");
    graph.add_node(Node::new("bad", "failing")).unwrap();
    graph.add_node(spy_node("good", 100, 100)).unwrap();

    let result = f.processor.execute_graph(graph, &mut NullProgress);
    assert!(matches!(
        result,
        Err(GraphError::TileComputationFailed { node_id, .. }) if node_id == "bad"
    ));

    // Execution started and was stopped; the failing tile never reported
    // a tile_stopped event.
    let events = f.observer.events();
    assert_eq!(events.first().map(String::as_str), Some("started"));
    assert_eq!(events.last().map(String::as_str), Some("stopped"));
    assert!(!events.contains(&"tile_stopped:0,0".to_string()));

    // Disposal still ran for the initialized spy.
    assert_eq!(*f.stats.disposes.lock().unwrap(), vec!["good".to_string()]);
}

#[test]
fn test_graph_document_roundtrip_executes() {
    let f = fixture();

    let json = r#"{
        "id": "doc",
        "version": "1.0",
        "nodes": [
            {
                "id": "read",
                "operator_name": "constant",
                "configuration": {
                    "name": "parameters",
                    "children": [
                        {"name": "width", "value": "100"},
                        {"name": "height", "value": "100"},
                        {"name": "value", "value": "1.0"}
                    ]
                }
            },
            {
                "id": "write",
                "operator_name": "spy",
                "sources": [{"name": "input", "source_node_id": "read"}],
                "configuration": {
                    "name": "parameters",
                    "children": [{"name": "label", "value": "write"}]
                }
            }
        ]
    }"#;

    let graph = Graph::from_json(json).unwrap();
    let roundtrip = Graph::from_json(&graph.to_json().unwrap()).unwrap();
    assert_eq!(roundtrip, graph);

    f.processor.execute_graph(graph, &mut NullProgress).unwrap();
    assert_eq!(f.stats.computes_of("write"), 4);
}
