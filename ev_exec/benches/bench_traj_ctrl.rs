//! # Trajectory Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::tc::run::{RunConfig, RunMode};
use ev_lib::traj_ctrl::{BonusPath, Params, Path, SCurveProfile, SpeedCtrl};

fn params() -> Params {
    util::params::from_str(include_str!("../../params/traj_ctrl.toml"))
        .expect("traj_ctrl.toml is invalid")
}

fn path_benchmark(c: &mut Criterion) {
    let params = params();
    let run_config = RunConfig {
        mode: RunMode::Bonus,
        target_distance_m: 8.0,
        target_time_s: 12.0,
        bonus_gap_m: 0.5,
    };

    c.bench_function("bonus path build", |b| {
        b.iter(|| Path::new(black_box(&run_config), black_box(&params)))
    });

    let path = BonusPath::new(8200.0, 462.5, 50).expect("Bonus path is invalid");
    c.bench_function("bonus path length 500 steps", |b| {
        b.iter(|| path.length_with_steps(black_box(500)))
    });
}

fn profile_benchmark(c: &mut Criterion) {
    let params = params();

    let scurve = SCurveProfile::new(8200.0, 12.0, 775.0, 2000.0, Some(1400.0))
        .expect("S-curve profile is infeasible");
    c.bench_function("s-curve full run", |b| {
        b.iter(|| {
            let mut t = 0.0;
            while t < 12.0 {
                black_box(scurve.velocity_at(t));
                t += 0.01;
            }
        })
    });

    c.bench_function("closed loop full run", |b| {
        b.iter(|| {
            let mut ctrl = SpeedCtrl::new(8200.0, 12.0, &params).expect("Invalid speed params");
            let mut t = 0.0;
            let mut dist = 0.0;
            while t < 12.0 {
                t += 0.01;
                dist += ctrl.target_speed_mms(t, dist) * 0.01;
            }
            black_box(dist)
        })
    });
}

criterion_group!(benches, path_benchmark, profile_benchmark);
criterion_main!(benches);
