use orbit_core::{LoopbackDevice, Orchestrator};
use orbit_shared::{DeviceEvent, NoteSlot, Target};

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    println!("[Headless] Building orchestrator...");

    let mut seq = Orchestrator::new();
    let device = LoopbackDevice::new();
    device.define_parameter("numEvents_A", 8.0);
    device.define_parameter("numEvents_B", 5.0);

    seq.connect(Box::new(device.clone()));
    seq.device_ready();
    println!(
        "[Headless] Device ready. Resync pushed {} commands.",
        device.take_sent().len()
    );

    // A few edits the way the UI would make them
    seq.set_note(2, NoteSlot::new(64, 96));
    seq.toggle_active(3, Target::A);
    seq.set_start_index(Target::B, 5);
    for cmd in device.take_sent() {
        println!("[Headless] -> {} {:?}", cmd.tag(), cmd.payload());
    }

    // Pretend the engine fires steps while the shape spins
    let listener = seq.register_trigger_listener(Target::B, |i| {
        println!("[Headless] B fired step {}", i);
    });
    seq.on_telemetry(|ev| {
        println!("[Headless] telemetry {} {:?}", ev.tag, ev.payload);
    });
    for step in 0..3 {
        device.emit(DeviceEvent::trigger(Target::B, step));
        device.emit(DeviceEvent::angle(step as f64 * 0.4));
    }
    seq.process_device_events();

    // Half a second of render frames fading the pulses
    for _ in 0..30 {
        seq.decay_all(1.0 / 60.0);
    }
    println!(
        "[Headless] Visual state: {}",
        serde_json::to_string_pretty(seq.visual_events())?
    );

    seq.unregister_trigger_listener(listener);
    seq.close();
    println!("[Headless] Done.");
    Ok(())
}
