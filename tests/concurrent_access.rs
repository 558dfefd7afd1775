//! 读写锁的协作约定：写线程在写锁内分多步填充，读线程在读锁内只能看到完整状态

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use density_cube::{Cube, Limits, SharedCube};
use nalgebra::Vector3;

fn make_shared(n: i32) -> SharedCube {
    let mut cube = Cube::new();
    cube.set_limits(Limits::Dimensions {
        min: Vector3::zeros(),
        points: Vector3::repeat(n),
        spacing: Vector3::repeat(0.5),
    })
    .unwrap();
    cube.into_shared()
}

#[test]
fn readers_never_observe_a_partial_fill() {
    let shared = make_shared(8);
    let done = Arc::new(AtomicBool::new(false));
    let rounds = 50i32;

    let writer = {
        let shared = shared.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 1..=rounds {
                // 整个填充是一个逻辑上原子的写操作
                let mut cube = shared.write();
                let len = cube.len();
                for index in 0..len {
                    cube.set_value_index(index, f64::from(round)).unwrap();
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observations = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    {
                        let cube = shared.read();
                        let first = cube.data()[0];
                        assert!(cube.data().iter().all(|&v| v == first));
                        assert_eq!(cube.min_value(), first);
                        assert_eq!(cube.max_value(), first);
                        let sampled = cube.interpolate(&Vector3::new(1.3, 0.2, 2.9));
                        assert!((sampled - first).abs() < 1e-12);
                    }
                    observations += 1;
                    if finished {
                        break;
                    }
                }
                observations
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for reader in readers {
        assert!(reader.join().expect("reader panicked") > 0);
    }
    assert_eq!(shared.read().max_value(), f64::from(rounds));
}

#[test]
fn concurrent_readers_agree() {
    let shared = make_shared(6);
    shared.write().fill_with(|p| p.x * p.y - p.z);
    let expected = shared.read().interpolate(&Vector3::new(0.7, 1.1, 2.2));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                let cube = shared.read();
                (0..200)
                    .map(|_| cube.interpolate(&Vector3::new(0.7, 1.1, 2.2)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        let values = handle.join().expect("thread panicked");
        assert!(values.iter().all(|&v| v == expected));
    }
}
