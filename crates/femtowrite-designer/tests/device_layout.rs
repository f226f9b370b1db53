use femtowrite_core::{CompileError, Point3, SceneError};
use femtowrite_designer::{
    Device, Marker, MarkerParameters, Placement, Primitive, PrimitiveKind, ToolpathSink,
    TransformStack, Trench, TrenchParameters, Waveguide, WaveguideParameters,
};

fn waveguide(id: &str, y: f64) -> Primitive {
    let mut wg = Waveguide::with_id(id, WaveguideParameters::default());
    wg.start([0.0, y, 0.035])
        .unwrap()
        .linear([10.0, 0.0, 0.0])
        .unwrap();
    wg.end().unwrap()
}

#[derive(Default)]
struct Recorder {
    placed: Vec<(String, Point3)>,
}

impl ToolpathSink for Recorder {
    fn emit_placed(&mut self, primitive: &Primitive, placement: &TransformStack) -> Result<(), CompileError> {
        let start = primitive.start_point().unwrap_or_default();
        self.placed
            .push((primitive.id().to_string(), placement.apply_point(start)));
        Ok(())
    }
}

#[test]
fn test_duplicate_identifier_on_second_extend() {
    let mut device = Device::new("chip");
    device
        .extend(vec![waveguide("a", 1.0), waveguide("b", 2.0)])
        .unwrap();

    let err = device
        .extend(vec![waveguide("c", 3.0), waveguide("a", 4.0)])
        .unwrap_err();
    assert!(matches!(err, SceneError::DuplicateIdentifier(ref id) if id == "a"));
    // the rejected batch left nothing behind
    assert_eq!(device.len(), 2);
    assert!(!device.contains("c"));
}

#[test]
fn test_mixed_primitives_keep_order() {
    let mut device = Device::new("chip");
    device.add(waveguide("wg", 1.0)).unwrap();
    device
        .add(
            Trench::with_id("tr", TrenchParameters::default())
                .block(2.0, 5.0)
                .unwrap(),
        )
        .unwrap();
    device
        .add_placed(
            Marker::with_id("mk", MarkerParameters::default())
                .cross(0.0, 0.0)
                .unwrap(),
            Placement::at([20.0, 20.0, 0.0]),
        )
        .unwrap();

    let kinds: Vec<PrimitiveKind> = device.primitives().map(|p| p.kind()).collect();
    assert_eq!(
        kinds,
        vec![PrimitiveKind::Waveguide, PrimitiveKind::Trench, PrimitiveKind::Marker]
    );

    let mut sink = Recorder::default();
    device.compile(&mut sink).unwrap();
    let ids: Vec<&str> = sink.placed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["wg", "tr", "mk"]);
    assert_eq!(sink.placed[0].1, Point3::new(0.0, 1.0, 0.035));

    let bbox = device.bounding_box().unwrap().unwrap();
    assert!(bbox.max.x >= 20.0 && bbox.max.y >= 20.0);
    assert!(device.total_length() > 10.0);
}

#[test]
fn test_rotated_placement() {
    let mut device = Device::new("rotated");
    device
        .add_placed(
            waveguide("wg", 0.0),
            Placement::at([5.0, 5.0, 0.0]).rotated(std::f64::consts::FRAC_PI_2),
        )
        .unwrap();
    let bbox = device.bounding_box().unwrap().unwrap();
    assert!((bbox.width()).abs() < 1e-9);
    assert!((bbox.height() - 10.0).abs() < 1e-9);
}

#[test]
fn test_device_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chip.json");

    let mut device = Device::new("chip");
    device.add(waveguide("a", 1.0)).unwrap();
    device.add(waveguide("b", 1.08)).unwrap();
    std::fs::write(&path, device.to_json().unwrap()).unwrap();

    let loaded = Device::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.name(), "chip");
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains("b"));
}
