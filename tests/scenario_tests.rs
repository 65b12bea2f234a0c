use drape::glam::{DVec3, Vec3};
use drape::{
    ClothConfig, ClothSimulation, CollisionSphere, FixedParticle, ForceUpdate, GravityFrame, NoOpStepObserver,
    StepObserver,
};

fn unit_square() -> ClothConfig {
    ClothConfig::new([
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
    ])
    .with_spacing(0.5, 0.5)
}

#[test]
fn still_air_leaves_square_untouched() {
    let mut sim = ClothSimulation::build(&unit_square()).unwrap();
    assert_eq!((sim.width(), sim.height()), (3, 3));
    let before = sim.particles().positions().to_vec();

    let frame = sim.tick(&mut NoOpStepObserver);

    assert_eq!(frame.width, 3);
    assert_eq!(frame.height, 3);
    assert_eq!(frame.step, 1);
    for (a, b) in before.iter().zip(frame.data.positions.iter()) {
        assert!((a - b).abs() < 1e-12, "drifted from {} to {}", a, b);
    }
    for n in frame.data.normals.chunks_exact(3) {
        let n = Vec3::from_slice(n);
        assert!((n - Vec3::Z).length() < 1e-6, "normal {:?}", n);
    }
    assert_eq!(frame.topology.indices.len(), 2 * 2 * 2 * 3);
    assert_eq!(frame.topology.uvs.len(), 9 * 2);
    assert_eq!(sim.guards().total(), 0);
}

#[test]
fn frame_encodes_positions() {
    let corners = [
        DVec3::new(6_378_137.0, 0.0, 0.0),
        DVec3::new(6_378_137.0, 10.0, 0.0),
        DVec3::new(6_378_137.0, 10.0, 10.0),
        DVec3::new(6_378_137.0, 0.0, 10.0),
    ];
    let mut sim = ClothSimulation::build(&ClothConfig::new(corners).with_spacing(5.0, 5.0)).unwrap();
    let frame = sim.publish();
    let data = &frame.data;
    assert_eq!(data.positions_high.len(), data.positions.len());
    for i in 0..data.positions.len() {
        let decoded = data.positions_high[i] as f64 + data.positions_low[i] as f64;
        assert!((decoded - data.positions[i]).abs() < 1e-2);
    }
}

#[test]
fn pinned_top_row_drapes_under_gravity() {
    let config = ClothConfig::new([
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(4.0, 0.0, 0.0),
        DVec3::new(4.0, 4.0, 0.0),
        DVec3::new(0.0, 4.0, 0.0),
    ])
    .with_spacing(1.0, 1.0)
    .with_gravity_frame(GravityFrame::World)
    .with_gravity(DVec3::Z)
    .with_time_step(0.1);
    let mut sim = ClothSimulation::build(&config).unwrap();
    let top: Vec<_> = (0..sim.width()).map(|x| FixedParticle::pin(x, 0)).collect();
    sim.apply(ForceUpdate::fixed(top)).unwrap();

    let bottom = sim.height() - 1;
    let top_before: Vec<_> = (0..sim.width()).map(|x| sim.position_at(x, 0).unwrap()).collect();

    for _ in 0..120 {
        sim.step(&mut NoOpStepObserver);
    }

    for x in 0..sim.width() {
        assert_eq!(sim.position_at(x, 0).unwrap(), top_before[x]);
        let pos = sim.position_at(x, bottom).unwrap();
        assert!(pos.z < -0.5, "column {} did not fall: {:?}", x, pos);
    }
}

#[test]
fn sphere_sweeps_through_cloth() {
    let mut sim = ClothSimulation::build(&unit_square().with_spacing(0.1, 0.1)).unwrap();
    let sphere = CollisionSphere::new(DVec3::new(0.5, 0.5, -1.0), 0.3).moving_to(DVec3::new(0.5, 0.5, 1.0), 0.05);
    sim.apply(ForceUpdate::spheres(vec![sphere])).unwrap();

    let mut frame = sim.tick(&mut NoOpStepObserver);
    for _ in 0..20 {
        frame = sim.tick(&mut NoOpStepObserver);
    }

    let center = frame.spheres[0].center;
    assert!(center.z > -1.0);
    for i in 0..sim.particles().len() {
        assert!(sim.particles().position(i).distance(center) >= 0.3 - 1e-9);
    }
}

#[test]
fn wind_lifts_free_cloth() {
    let mut sim = ClothSimulation::build(&unit_square().with_wind(DVec3::new(0.0, 0.0, 5.0)).with_time_step(0.1)).unwrap();
    for _ in 0..10 {
        sim.step(&mut NoOpStepObserver);
    }
    let center = sim.position_at(1, 1).unwrap();
    assert!(center.z > 0.0, "center z = {}", center.z);
}

struct PhaseLog(Vec<&'static str>);

impl StepObserver for PhaseLog {
    fn on_forces(&mut self) { self.0.push("forces"); }
    fn on_constraint_iteration(&mut self, _iteration: usize) {
        if self.0.last() != Some(&"constraints") {
            self.0.push("constraints");
        }
    }
    fn on_integrate(&mut self) { self.0.push("integrate"); }
    fn on_collisions(&mut self) { self.0.push("collisions"); }
    fn on_step_complete(&mut self, _step: u64) { self.0.push("complete"); }
}

#[test]
fn pipeline_runs_in_order() {
    let mut sim = ClothSimulation::build(&unit_square()).unwrap();
    let mut log = PhaseLog(Vec::new());
    sim.step(&mut log);
    assert_eq!(log.0, ["forces", "constraints", "integrate", "collisions", "complete"]);
}
