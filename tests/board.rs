use piboard::gpio::mock::{MockDriver, Op};
use piboard::gpio::{Board, Error, Level, Mode};

fn mock_board() -> (Board, MockDriver) {
    let mock = MockDriver::new();
    let board = Board::with_driver(Box::new(mock.clone()));

    (board, mock)
}

#[test]
fn reserved_pins_cannot_be_claimed() {
    let (board, mock) = mock_board();

    for &(pin, reason) in board.reserved_pins() {
        match board.claim(pin, Mode::Output) {
            Err(Error::ReservedPin(p, r)) => {
                assert_eq!(p, pin);
                assert_eq!(r, reason);
            }
            other => panic!("expected ReservedPin for pin {}, got {:?}", pin, other),
        }
    }

    // No hardware calls, no state change
    assert!(mock.ops().is_empty());
    assert!(board.claim(3, Mode::Output).is_ok());
}

#[test]
fn out_of_range_positions_are_rejected_everywhere() {
    let (board, mock) = mock_board();

    for pin in [0u8, 41, 255] {
        assert!(matches!(
            board.claim(pin, Mode::Output),
            Err(Error::InvalidPin(p)) if p == pin
        ));
        assert!(matches!(
            board.release(pin),
            Err(Error::InvalidPin(p)) if p == pin
        ));
        assert!(matches!(
            board.is_reserved(pin),
            Err(Error::InvalidPin(p)) if p == pin
        ));
    }

    assert!(mock.ops().is_empty());
}

#[test]
fn is_reserved_matches_the_catalogue() {
    let (board, _mock) = mock_board();

    assert!(board.is_reserved(1).unwrap());
    assert!(board.is_reserved(39).unwrap());
    assert!(!board.is_reserved(3).unwrap());
    assert!(!board.is_reserved(40).unwrap());
}

#[test]
fn double_claim_fails_and_keeps_first_claim_usable() {
    let (board, mock) = mock_board();

    let mut first = board.claim(3, Mode::Output).unwrap();
    assert!(matches!(
        board.claim(3, Mode::Input),
        Err(Error::PinUsed(3))
    ));
    assert!(matches!(
        board.claim(3, Mode::Output),
        Err(Error::PinUsed(3))
    ));

    // The refused claims configured nothing
    assert_eq!(mock.ops(), vec![Op::Configure(3, Mode::Output)]);

    // The first claim still works
    first.set_high().unwrap();
    assert!(first.is_set_high().unwrap());
}

#[test]
fn input_pins_cannot_be_driven_but_can_be_read() {
    let (board, mock) = mock_board();
    mock.set_input_level(5, Level::High);

    let mut pin = board.claim(5, Mode::Input).unwrap();

    assert!(matches!(
        pin.set_high(),
        Err(Error::WrongMode {
            pin: 5,
            mode: Mode::Input
        })
    ));
    assert!(matches!(
        pin.write(Level::Low),
        Err(Error::WrongMode { .. })
    ));
    assert!(matches!(pin.toggle(), Err(Error::WrongMode { .. })));
    assert!(matches!(pin.is_set_high(), Err(Error::WrongMode { .. })));

    assert_eq!(pin.read().unwrap(), Level::High);
    assert!(pin.is_high().unwrap());
}

#[test]
fn output_pins_cannot_be_read() {
    let (board, _mock) = mock_board();

    let mut pin = board.claim(7, Mode::Output).unwrap();
    assert!(matches!(
        pin.read(),
        Err(Error::WrongMode {
            pin: 7,
            mode: Mode::Output
        })
    ));

    pin.set_high().unwrap();
    assert!(pin.is_set_high().unwrap());
    pin.toggle().unwrap();
    assert!(pin.is_set_low().unwrap());
}

#[test]
fn direction_is_not_sticky_across_release() {
    let (board, mock) = mock_board();

    let mut pin = board.claim(5, Mode::Output).unwrap();
    pin.set_high().unwrap();
    pin.set_low().unwrap();
    board.release(5).unwrap();

    let pin = board.claim(5, Mode::Input).unwrap();
    assert_eq!(pin.mode(), Mode::Input);
    assert_eq!(pin.read().unwrap(), Level::Low);

    assert_eq!(
        mock.ops(),
        vec![
            Op::Configure(5, Mode::Output),
            Op::Write(5, Level::High),
            Op::Write(5, Level::Low),
            // release lowers the output before removing the claim
            Op::Write(5, Level::Low),
            Op::Configure(5, Mode::Input),
            Op::Read(5),
        ]
    );
}

#[test]
fn release_of_an_unclaimed_pin_fails_cleanly() {
    let (board, _mock) = mock_board();

    assert!(matches!(board.release(3), Err(Error::NotClaimed(3))));

    board.claim(3, Mode::Output).unwrap();
    board.release(3).unwrap();
    assert!(matches!(board.release(3), Err(Error::NotClaimed(3))));
}

#[test]
fn stale_handles_fail_after_release() {
    let (board, _mock) = mock_board();

    let mut pin = board.claim(11, Mode::Output).unwrap();
    board.release(11).unwrap();

    assert!(matches!(pin.set_high(), Err(Error::NotClaimed(11))));
    assert!(matches!(pin.is_set_high(), Err(Error::NotClaimed(11))));
}

#[test]
fn shutdown_lowers_every_output_before_the_driver_stops() {
    let (board, mock) = mock_board();

    let mut a = board.claim(3, Mode::Output).unwrap();
    let mut b = board.claim(5, Mode::Output).unwrap();
    board.claim(8, Mode::Input).unwrap();
    a.set_high().unwrap();
    b.set_high().unwrap();

    board.shutdown().unwrap();

    let ops = mock.ops();
    let shutdown_index = ops.iter().position(|&op| op == Op::Shutdown).unwrap();
    let lowering: Vec<u8> = ops[..shutdown_index]
        .iter()
        .skip_while(|&&op| op != Op::Write(3, Level::High) && op != Op::Write(5, Level::High))
        .filter_map(|&op| match op {
            Op::Write(pin, Level::Low) => Some(pin),
            _ => None,
        })
        .collect();

    // Exactly one low write per claimed output, in any order, all before
    // the driver shutdown; the input pin is left alone.
    let mut lowered = lowering.clone();
    lowered.sort_unstable();
    assert_eq!(lowered, vec![3, 5]);
    assert_eq!(mock.shutdown_count(), 1);

    // The board is terminal, even for reserved positions
    assert!(matches!(board.claim(1, Mode::Output), Err(Error::Closed)));
    assert!(matches!(board.claim(3, Mode::Output), Err(Error::Closed)));
    assert!(matches!(board.release(5), Err(Error::Closed)));
    assert!(matches!(a.set_high(), Err(Error::Closed)));
    assert!(matches!(b.read(), Err(Error::Closed)));
}

#[test]
fn shutdown_is_idempotent() {
    let (board, mock) = mock_board();

    board.claim(3, Mode::Output).unwrap();
    board.shutdown().unwrap();
    board.shutdown().unwrap();

    assert_eq!(mock.shutdown_count(), 1);
}

#[test]
fn shutdown_collects_failures_without_aborting() {
    let (board, mock) = mock_board();

    board.claim(3, Mode::Output).unwrap();
    board.claim(5, Mode::Output).unwrap();
    mock.fail_writes(3);

    match board.shutdown() {
        Err(Error::Cleanup(failed)) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, 3);
        }
        other => panic!("expected Cleanup, got {:?}", other),
    }

    // The other output was still lowered and the driver still shut down
    let ops = mock.ops();
    assert!(ops.contains(&Op::Write(5, Level::Low)));
    assert_eq!(mock.shutdown_count(), 1);
    assert!(matches!(board.claim(7, Mode::Output), Err(Error::Closed)));
}

#[test]
fn reserved_claim_release_reclaim_scenario() {
    let (board, mock) = mock_board();
    mock.set_input_level(3, Level::High);

    assert!(matches!(
        board.claim(1, Mode::Output),
        Err(Error::ReservedPin(1, "3.3V"))
    ));

    let _out = board.claim(3, Mode::Output).unwrap();
    assert!(matches!(
        board.claim(3, Mode::Input),
        Err(Error::PinUsed(3))
    ));

    board.release(3).unwrap();
    let input = board.claim(3, Mode::Input).unwrap();
    assert_eq!(input.read().unwrap(), Level::High);
}

#[test]
fn dropping_the_last_handle_shuts_the_board_down() {
    let mock = MockDriver::new();
    {
        let board = Board::with_driver(Box::new(mock.clone()));
        let mut pin = board.claim(3, Mode::Output).unwrap();
        pin.set_high().unwrap();
    }

    let ops = mock.ops();
    assert!(ops.contains(&Op::Write(3, Level::Low)));
    assert_eq!(mock.shutdown_count(), 1);
}

#[test]
fn clear_on_drop_can_be_disabled() {
    let mock = MockDriver::new();
    {
        let board = Board::with_driver(Box::new(mock.clone()));
        assert!(board.clear_on_drop());
        board.set_clear_on_drop(false);

        let mut pin = board.claim(3, Mode::Output).unwrap();
        pin.set_high().unwrap();
    }

    assert_eq!(mock.shutdown_count(), 0);
    assert!(!mock.ops().contains(&Op::Write(3, Level::Low)));
}

#[test]
fn boards_are_independent() {
    let (board_a, mock_a) = mock_board();
    let (board_b, mock_b) = mock_board();

    board_a.claim(3, Mode::Output).unwrap();
    board_b.claim(3, Mode::Input).unwrap();

    assert_eq!(mock_a.ops(), vec![Op::Configure(3, Mode::Output)]);
    assert_eq!(mock_b.ops(), vec![Op::Configure(3, Mode::Input)]);
}

#[test]
fn shared_clones_serialize_claims() {
    let (board, _mock) = mock_board();
    let clone = board.clone();

    board.claim(3, Mode::Output).unwrap();
    assert!(matches!(
        clone.claim(3, Mode::Output),
        Err(Error::PinUsed(3))
    ));
}
