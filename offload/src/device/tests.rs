use super::*;
use crate::common::Error;

const TARGET: &str = "rev_b";

fn threshold_artifact(level: i32) -> BinaryArtifact {
    let kernel = EmulatedKernel::threshold("threshold", level);
    let artifact = EmulatorArtifact::new(TARGET, vec![kernel]);
    BinaryArtifact::from_bytes("threshold.sw_emu", artifact.to_bytes().unwrap())
}

fn platform(targets: &[&str]) -> EmulatorPlatform {
    EmulatorPlatform::new(
        targets
            .iter()
            .enumerate()
            .map(|(i, target)| EmulatedDevice::new(format!("board-{i}"), *target))
            .collect(),
    )
}

fn establish<'p>(
    platform: &'p EmulatorPlatform,
    artifact: &BinaryArtifact,
) -> crate::common::Result<Session<'p, EmulatorPlatform>> {
    let catalog = DeviceCatalog::enumerate(platform);
    Session::establish(platform, &catalog, artifact, "threshold", &THRESHOLD_LAYOUT)
}

#[test]
fn first_programmable_device_wins() {
    let platform = platform(&["rev_a", "rev_a", TARGET, TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();

    assert_eq!(session.device_index(), 2);
    assert_eq!(session.device().spec().name, "board-2");
    assert_eq!(session.entry_point().name(), "threshold");
    assert_eq!(session.entry_point().arity(), Some(3));
    assert_eq!(platform.program_attempts(), vec![0, 1, 2]);
}

#[test]
fn exhausted_catalog_is_no_usable_device() {
    let platform = platform(&["rev_a", "rev_c", "rev_d"]);
    let err = establish(&platform, &threshold_artifact(90)).unwrap_err();

    assert!(matches!(err, Error::NoUsableDevice { tried: 3 }), "{err}");
    assert_eq!(platform.program_attempts(), vec![0, 1, 2]);
}

#[test]
fn empty_catalog_is_no_usable_device() {
    let platform = platform(&[]);
    let err = establish(&platform, &threshold_artifact(90)).unwrap_err();

    assert!(matches!(err, Error::NoUsableDevice { tried: 0 }), "{err}");
}

#[test]
fn foreign_binary_is_rejected_by_every_device() {
    let platform = platform(&[TARGET, TARGET]);
    let artifact = BinaryArtifact::from_bytes("kernel.xclbin", vec![0x78, 0x63, 0x6c, 0x00, 0xff]);

    let err = establish(&platform, &artifact).unwrap_err();
    assert!(matches!(err, Error::NoUsableDevice { tried: 2 }), "{err}");
}

#[test]
fn missing_entry_point_is_accelerator_error() {
    let platform = platform(&[TARGET]);
    let catalog = DeviceCatalog::enumerate(&platform);

    let err = Session::establish(
        &platform,
        &catalog,
        &threshold_artifact(90),
        "sobel",
        &THRESHOLD_LAYOUT,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Accelerator(_)), "{err}");
}

#[test]
fn pipeline_runs_in_order() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();

    let completed = BufferPipeline::execute(&session, vec![50, 100, 150, 200]).unwrap();

    assert_eq!(completed.output(), &[0, 1, 1, 1]);
    assert_eq!(completed.input(), &[50, 100, 150, 200]);
    assert!(completed.kernel_time().is_some());
    assert_eq!(
        session.queue().history(),
        vec![
            Command::Write { len: 4 },
            Command::Task {
                kernel: "threshold".to_string()
            },
            Command::Read { len: 4 },
            Command::Finish,
        ]
    );
}

#[test]
fn pipeline_steps_expose_buffers_not_storage() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(0)).unwrap();

    let allocated = BufferPipeline::allocate(&session, vec![0, 1, 2]).unwrap();
    assert_eq!(allocated.input_buffer().access(), BufferAccess::ReadOnly);
    assert_eq!(allocated.output_buffer().access(), BufferAccess::WriteOnly);
    assert_eq!(allocated.output_buffer().byte_size(), 12);

    let in_flight = allocated
        .bind()
        .unwrap()
        .migrate_in()
        .unwrap()
        .dispatch()
        .unwrap()
        .migrate_out()
        .unwrap();
    assert_eq!(in_flight.len(), 3);

    let completed = in_flight.synchronize().unwrap();
    assert_eq!(completed.into_output(), vec![0, 1, 1]);
}

#[test]
fn transfers_stay_queued_until_synchronize() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();

    let in_flight = BufferPipeline::allocate(&session, vec![95, 5])
        .unwrap()
        .bind()
        .unwrap()
        .migrate_in()
        .unwrap()
        .dispatch()
        .unwrap()
        .migrate_out()
        .unwrap();
    assert!(!session.queue().history().contains(&Command::Finish));

    in_flight.synchronize().unwrap();
    let history = session.queue().history();
    assert_eq!(history.iter().filter(|c| **c == Command::Finish).count(), 1);
    assert_eq!(history.last(), Some(&Command::Finish));
}

#[test]
fn abandoned_pipeline_drains_queue() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();

    let dispatched = BufferPipeline::allocate(&session, vec![1, 2])
        .unwrap()
        .bind()
        .unwrap()
        .migrate_in()
        .unwrap()
        .dispatch()
        .unwrap();
    drop(dispatched);

    assert_eq!(session.queue().history().last(), Some(&Command::Finish));
}

#[test]
fn empty_input_is_rejected() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();

    let err = BufferPipeline::allocate(&session, Vec::new()).err().unwrap();
    assert!(matches!(err, Error::Accelerator(_)), "{err}");
}

#[test]
fn arity_mismatch_fails_binding() {
    let platform = platform(&[TARGET]);
    let artifact = EmulatorArtifact::new(
        TARGET,
        vec![EmulatedKernel::threshold("threshold", 90).with_arity(4)],
    );
    let artifact = BinaryArtifact::from_bytes("wide.sw_emu", artifact.to_bytes().unwrap());
    let session = establish(&platform, &artifact).unwrap();

    let err = BufferPipeline::allocate(&session, vec![1, 2, 3])
        .unwrap()
        .bind()
        .err()
        .unwrap();

    match err {
        Error::Accelerator(e) => assert!(e.message.contains("declares 4"), "{e}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn swapped_buffers_fail_binding() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();
    let pipeline = BufferPipeline::allocate(&session, vec![1, 2, 3]).unwrap();

    let err = ThresholdArgs {
        output: pipeline.input_buffer(),
        input: pipeline.output_buffer(),
        count: 3,
    }
    .bind(&session)
    .unwrap_err();

    match err {
        Error::Accelerator(e) => assert!(e.message.contains("argument 0 (output)"), "{e}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn count_beyond_buffers_fails_binding() {
    let platform = platform(&[TARGET]);
    let session = establish(&platform, &threshold_artifact(90)).unwrap();
    let pipeline = BufferPipeline::allocate(&session, vec![1, 2, 3]).unwrap();

    let err = ThresholdArgs {
        output: pipeline.output_buffer(),
        input: pipeline.input_buffer(),
        count: 4,
    }
    .bind(&session)
    .unwrap_err();

    assert!(matches!(err, Error::Accelerator(_)), "{err}");
}

#[test]
fn injected_fault_flips_one_sample() {
    let platform = platform(&[TARGET]);
    let artifact = EmulatorArtifact::new(
        TARGET,
        vec![EmulatedKernel::threshold("threshold", 90).with_faults(vec![1])],
    );
    let artifact = BinaryArtifact::from_bytes("faulty.sw_emu", artifact.to_bytes().unwrap());
    let session = establish(&platform, &artifact).unwrap();

    let completed = BufferPipeline::execute(&session, vec![50, 100, 150, 200]).unwrap();
    assert_eq!(completed.output(), &[0, 0, 1, 1]);
}

#[test]
fn emulator_artifact_yaml_layout() {
    let parsed = EmulatorArtifact::parse(
        b"target: sw_emu\nkernels:\n  - name: threshold\n    op: threshold\n    level: 90\n",
    )
    .unwrap();

    assert_eq!(
        parsed,
        EmulatorArtifact::new("sw_emu", vec![EmulatedKernel::threshold("threshold", 90)])
    );
    assert!(EmulatorArtifact::parse(&[0xff, 0xfe, 0x00]).is_err());
}
