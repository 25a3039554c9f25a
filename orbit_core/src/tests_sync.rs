//! End-to-end sync behavior over the loopback device: what goes out on
//! the wire for each mutation, and what comes back in from triggers.

use std::cell::RefCell;
use std::rc::Rc;

use orbit_shared::{DeviceCommand, DeviceEvent, NoteSlot, Target};

use crate::device::LoopbackDevice;
use crate::Orchestrator;

/// Orchestrator connected to a ready loopback with the initial resync
/// already drained, so tests see only their own traffic.
fn connected() -> (Orchestrator, Rc<LoopbackDevice>) {
    let mut seq = Orchestrator::new();
    let device = LoopbackDevice::new();
    assert!(seq.connect(Box::new(device.clone())));
    seq.device_ready();
    device.take_sent();
    (seq, device)
}

#[test]
fn test_initial_resync_contents() {
    let mut seq = Orchestrator::new();
    let device = LoopbackDevice::new();
    seq.connect(Box::new(device.clone()));
    seq.device_ready();

    let sent = device.take_sent();
    // 16 notes, 8 + 5 active flags, 2 start indices
    assert_eq!(sent.len(), 16 + 8 + 5 + 2);

    let notes: Vec<_> = sent
        .iter()
        .filter(|c| matches!(c, DeviceCommand::UpdateNote { .. }))
        .collect();
    assert_eq!(notes.len(), 16);
    assert_eq!(
        *notes[0],
        DeviceCommand::UpdateNote {
            index: 0,
            pitch: 55,
            velocity: 110,
        }
    );

    assert_eq!(device.parameter("numEvents_A"), Some(8.0));
    assert_eq!(device.parameter("numEvents_B"), Some(5.0));
}

#[test]
fn test_resync_not_repeated_after_error_recovery() {
    let (mut seq, device) = connected();

    seq.device_error();
    seq.connect(Box::new(device.clone()));
    seq.device_ready();

    assert_eq!(device.sent_count(), 0);
}

#[test]
fn test_toggle_inside_window_reaches_device() {
    // N=16, A window {start 0, count 8}; activating slot 3 must go out
    // as update_active_A[3, 1]
    let (mut seq, device) = connected();

    seq.set_active(3, true, Target::A);
    assert!(seq.is_active(3, Target::A));
    assert!(seq.visual_event(3).unwrap().active);

    let sent = device.take_sent();
    assert_eq!(
        sent,
        vec![DeviceCommand::UpdateActive {
            target: Target::A,
            relative_index: 3,
            active: true,
        }]
    );
}

#[test]
fn test_toggle_outside_window_suppressed_then_healed() {
    let (mut seq, device) = connected();

    // Slot 12 is outside A's default 0..8 window: local state updates,
    // nothing goes out
    seq.set_active(12, false, Target::A);
    assert!(!seq.is_active(12, Target::A));
    assert!(device.take_sent().is_empty());

    // Moving the window over slot 12 re-sends the covered flags,
    // including the edit made while it was hidden
    seq.set_start_index(Target::A, 8);
    let sent = device.take_sent();
    assert_eq!(
        sent[0],
        DeviceCommand::StartIndex {
            target: Target::A,
            start_index: 8,
        }
    );
    assert!(sent.contains(&DeviceCommand::UpdateActive {
        target: Target::A,
        relative_index: 4,
        active: false,
    }));
}

#[test]
fn test_set_note_always_sends_absolute() {
    let (mut seq, device) = connected();

    // Slot 14 is outside both default windows; note writes still go out
    seq.set_note(14, NoteSlot::new(45, 70));
    assert_eq!(
        device.take_sent(),
        vec![DeviceCommand::UpdateNote {
            index: 14,
            pitch: 45,
            velocity: 70,
        }]
    );
}

#[test]
fn test_resize_clamps_and_writes_param() {
    // setNumEvents(A, 20) with N=16 clamps to 16
    let (mut seq, device) = connected();

    assert_eq!(seq.set_num_events(Target::A, 20), 16);
    assert_eq!(seq.window(Target::A).num_events, 16);
    assert_eq!(device.parameter("numEvents_A"), Some(16.0));

    assert_eq!(seq.set_num_events(Target::A, 0), 3);
    assert_eq!(device.parameter("numEvents_A"), Some(3.0));
}

#[test]
fn test_grow_past_end_pulls_window_back() {
    // A at start 10 with a small window; growing to 8 would end at 18,
    // so the start is pulled back to 8
    let (mut seq, _device) = connected();

    seq.set_num_events(Target::A, 3);
    assert_eq!(seq.set_start_index(Target::A, 10), 10);
    assert_eq!(seq.set_num_events(Target::A, 8), 8);

    let w = seq.window(Target::A);
    assert_eq!(w.start_index, 8);
    assert_eq!(w.end(), 16);
}

#[test]
fn test_trigger_pulses_and_routes_to_matching_target() {
    // B window {start 5, count 6}; trigger_B with relative 2 resolves to
    // absolute 7
    let (mut seq, device) = connected();
    seq.set_start_index(Target::B, 5);
    seq.set_num_events(Target::B, 6);

    let hits_a = Rc::new(RefCell::new(Vec::new()));
    let hits_b = Rc::new(RefCell::new(Vec::new()));
    let a = hits_a.clone();
    seq.register_trigger_listener(Target::A, move |i| a.borrow_mut().push(i));
    let b = hits_b.clone();
    seq.register_trigger_listener(Target::B, move |i| b.borrow_mut().push(i));

    device.emit(DeviceEvent::trigger(Target::B, 2));
    seq.process_device_events();

    let ev = seq.visual_event(7).unwrap();
    assert!(ev.triggered);
    assert_eq!(ev.pulse_energy, 1.0);

    // Listeners get the device's own relative index; A hears nothing
    assert_eq!(*hits_b.borrow(), vec![2]);
    assert!(hits_a.borrow().is_empty());
}

#[test]
fn test_trigger_on_inactive_slot_does_not_pulse() {
    let (mut seq, device) = connected();
    seq.set_active(2, false, Target::A);
    seq.set_active(2, false, Target::B);

    device.emit(DeviceEvent::trigger(Target::A, 2));
    seq.process_device_events();

    let ev = seq.visual_event(2).unwrap();
    assert!(!ev.triggered);
    assert_eq!(ev.pulse_energy, 0.0);
}

#[test]
fn test_stale_trigger_beyond_window_dropped() {
    let (mut seq, device) = connected();
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    seq.register_trigger_listener(Target::B, move |_| *h.borrow_mut() += 1);

    // B's window holds 5 events; a relative index of 9 is stale
    device.emit(DeviceEvent::trigger(Target::B, 9));
    seq.process_device_events();

    assert_eq!(*hits.borrow(), 0);
    assert!(seq.visual_events().iter().all(|ev| !ev.triggered));
}

#[test]
fn test_back_to_back_triggers_in_one_drain() {
    let (mut seq, device) = connected();
    let hits = Rc::new(RefCell::new(Vec::new()));
    let h = hits.clone();
    seq.register_trigger_listener(Target::A, move |i| h.borrow_mut().push(i));

    device.emit(DeviceEvent::trigger(Target::A, 0));
    device.emit(DeviceEvent::trigger(Target::A, 1));
    device.emit(DeviceEvent::trigger(Target::A, 0));
    seq.process_device_events();

    assert_eq!(*hits.borrow(), vec![0, 1, 0]);
}

#[test]
fn test_receipt_time_mapping_survives_window_move() {
    // The trigger maps against the window as it stands when the event is
    // drained; a later move does not remap the pulse
    let (mut seq, device) = connected();

    device.emit(DeviceEvent::trigger(Target::A, 1));
    seq.process_device_events();
    assert!(seq.visual_event(1).unwrap().triggered);

    seq.set_start_index(Target::A, 4);
    assert!(seq.visual_event(1).unwrap().triggered);
    assert!(!seq.visual_event(5).unwrap().triggered);
}

#[test]
fn test_telemetry_passthrough_untouched() {
    let (mut seq, device) = connected();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    seq.on_telemetry(move |ev| s.borrow_mut().push(ev.clone()));

    device.emit(DeviceEvent::angle(1.234));
    device.emit(DeviceEvent::new("lfo_phase", vec![0.25, 0.75]));
    seq.process_device_events();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].tag, "angle");
    assert_eq!(seen[0].payload, vec![1.234]);
    assert_eq!(seen[1].tag, "lfo_phase");
    assert_eq!(seen[1].payload, vec![0.25, 0.75]);
}

#[test]
fn test_ready_time_parameter_adoption() {
    let mut seq = Orchestrator::new();
    let device = LoopbackDevice::new();
    device.define_parameter("numEvents_A", 6.0);
    device.define_parameter("numEvents_B", 12.0);
    device.define_parameter("numCorners_B", 7.0);

    seq.connect(Box::new(device.clone()));
    seq.device_ready();

    assert_eq!(seq.window(Target::A).num_events, 6);
    assert_eq!(seq.window(Target::B).num_events, 12);
    assert_eq!(seq.num_corners(Target::B), 7);
    assert_eq!(seq.num_corners(Target::A), 5);

    // The resync reflects the adopted sizes: 16 notes + (6 + 12) flags
    // + 2 start indices
    assert_eq!(device.take_sent().len(), 16 + 6 + 12 + 2);
}

#[test]
fn test_mutations_before_ready_stay_local() {
    let mut seq = Orchestrator::new();
    let device = LoopbackDevice::new();
    seq.connect(Box::new(device.clone()));

    seq.set_note(0, NoteSlot::new(40, 90));
    seq.set_active(0, false, Target::A);
    assert_eq!(seq.note(0), Some(NoteSlot::new(40, 90)));
    assert!(!seq.is_active(0, Target::A));
    assert_eq!(device.sent_count(), 0);

    // The later resync carries the edits made while disconnected
    seq.device_ready();
    let sent = device.take_sent();
    assert!(sent.contains(&DeviceCommand::UpdateNote {
        index: 0,
        pitch: 40,
        velocity: 90,
    }));
    assert!(sent.contains(&DeviceCommand::UpdateActive {
        target: Target::A,
        relative_index: 0,
        active: false,
    }));
}

#[test]
fn test_send_failures_leave_local_state_intact() {
    let (mut seq, device) = connected();
    device.fail_sends(true);

    seq.set_note(5, NoteSlot::new(33, 44));
    seq.set_active(5, false, Target::A);
    seq.set_start_index(Target::A, 2);

    assert_eq!(seq.note(5), Some(NoteSlot::new(33, 44)));
    assert!(!seq.is_active(5, Target::A));
    assert_eq!(seq.window(Target::A).start_index, 2);
    assert_eq!(device.sent_count(), 0);
}

#[test]
fn test_close_stops_all_traffic() {
    let (mut seq, device) = connected();
    seq.close();

    seq.set_note(0, NoteSlot::new(60, 100));
    device.emit(DeviceEvent::trigger(Target::A, 0));
    seq.process_device_events();

    assert_eq!(device.sent_count(), 0);
    assert!(!seq.visual_event(0).unwrap().triggered);
    assert!(!seq.connect(Box::new(LoopbackDevice::new())));
}
