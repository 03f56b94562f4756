//! # Execution Properties
//!
//! Interpreter and dispatcher behavior across crate boundaries: gas
//! accounting, the call-depth bound, balance no-ops, and checkpoint
//! round-trips.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{addr, fresh_cache};
    use basalt_types::{BlockContext, Bytes, StorageKey, U256};
    use basalt_vm::prelude::*;

    fn dispatcher_for<'a>(
        cache: &'a mut basalt_state::StateCache,
        recovery: &'a K256Recovery,
    ) -> CallDispatcher<'a> {
        CallDispatcher::new(
            cache,
            BlockContext::default(),
            addr(1),
            U256::one(),
            VmConfig::default(),
            recovery,
        )
    }

    /// A contract that bumps its own storage counter and then calls itself
    /// with everything it has left.
    fn recursive_counter_code() -> Vec<u8> {
        vec![
            0x60, 0x00, 0x54, // SLOAD(0)
            0x60, 0x01, 0x01, // + 1
            0x60, 0x00, 0x55, // SSTORE(0, ·)
            0x60, 0x00, // out_size
            0x60, 0x00, // out_offset
            0x60, 0x00, // in_size
            0x60, 0x00, // in_offset
            0x60, 0x00, // value
            0x30, // ADDRESS
            0x5A, // GAS
            0xF1, // CALL
            0x00, // STOP
        ]
    }

    /// A contract that calls itself first and mutates storage afterwards, so
    /// gas exhaustion anywhere cascades a failure through every frame.
    fn recursive_burn_code() -> Vec<u8> {
        vec![
            0x60, 0x00, // out_size
            0x60, 0x00, // out_offset
            0x60, 0x00, // in_size
            0x60, 0x00, // in_offset
            0x60, 0x00, // value
            0x30, // ADDRESS
            0x5A, // GAS
            0xF1, // CALL
            0x50, // POP
            0x60, 0x01, 0x60, 0x00, 0x55, // SSTORE(0, 1)
            0x00, // STOP
        ]
    }

    #[test]
    fn test_gas_decreases_by_exactly_the_charged_fees() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        // PUSH1 2 PUSH1 3 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code = [
            0x60, 0x02, 0x60, 0x03, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3,
        ];
        cache.set_code(addr(2), Bytes::from_slice(&code)).unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);
        let result = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 10_000,
            depth: 0,
        });

        assert!(result.is_success());
        // 5 pushes (15) + ADD (3) + MSTORE (3 + 3 memory) + RETURN (0)
        assert_eq!(result.gas_used, 24);
    }

    #[test]
    fn test_oog_reports_the_full_limit() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        let code = [
            0x60, 0x02, 0x60, 0x03, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3,
        ];
        cache.set_code(addr(2), Bytes::from_slice(&code)).unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);
        let result = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 23, // One short of the 24 the program needs
            depth: 0,
        });

        assert!(matches!(result.error, Some(VmError::OutOfGas)));
        assert_eq!(result.gas_used, 23);
    }

    #[test]
    fn test_call_depth_bound_at_1024() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        cache
            .set_code(addr(2), Bytes::from_slice(&recursive_counter_code()))
            .unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);
        let result = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 20_000_000,
            depth: 0,
        });

        // The chain unwinds successfully; only the frame past the limit fails
        assert!(result.is_success());

        // Frames at depths 0..=1024 all ran; the 1025th invocation was
        // rejected before entering the interpreter
        let counter = cache
            .storage(addr(2), StorageKey::from(U256::zero()))
            .unwrap();
        assert_eq!(counter.to_u256(), U256::from(1025));
    }

    #[test]
    fn test_recursive_oog_consumes_limit_and_leaves_no_trace() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        cache
            .set_code(addr(2), Bytes::from_slice(&recursive_burn_code()))
            .unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);
        let result = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 100_000,
            depth: 0,
        });

        // Exhaustion cascades: every frame dies before its own SSTORE
        assert!(matches!(result.error, Some(VmError::OutOfGas)));
        assert_eq!(result.gas_used, 100_000);

        // No nested mutation survived
        assert!(cache
            .storage(addr(2), StorageKey::from(U256::zero()))
            .unwrap()
            .is_zero());
        assert_eq!(cache.balance(addr(1)).unwrap(), U256::from(1_000));
        assert_eq!(cache.depth(), 0);
    }

    #[test]
    fn test_balance_noop_for_call_and_create() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(40u64)).unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);

        let call = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::from(41),
            data: Bytes::new(),
            gas_limit: 50_000,
            depth: 0,
        });
        assert!(call.is_success());
        assert!(call.return_data.is_empty());

        let create = dispatcher.create(CreateMessage {
            creator: addr(1),
            value: U256::from(41),
            init_code: Bytes::from_slice(&[0x00]),
            gas_limit: 50_000,
            depth: 0,
            bump_nonce: true,
        });
        assert!(create.is_success());
        assert!(create.created_address.is_none());

        // Balances and nonces on both sides are untouched
        assert_eq!(cache.balance(addr(1)).unwrap(), U256::from(40));
        assert_eq!(cache.nonce(addr(1)).unwrap(), 0);
        assert_eq!(cache.balance(addr(2)).unwrap(), U256::zero());
        assert_eq!(cache.nonce(addr(2)).unwrap(), 0);
    }

    #[test]
    fn test_storage_survives_flush_and_reload() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        // SSTORE(5, 77)
        let code = [0x60, 0x4D, 0x60, 0x05, 0x55, 0x00];
        cache.set_code(addr(2), Bytes::from_slice(&code)).unwrap();

        let recovery = K256Recovery;
        let mut dispatcher = dispatcher_for(&mut cache, &recovery);
        let result = dispatcher.call(CallMessage {
            caller: addr(1),
            target: addr(2),
            code_address: None,
            value: U256::zero(),
            data: Bytes::new(),
            gas_limit: 50_000,
            depth: 0,
        });
        assert!(result.is_success());

        cache.flush().unwrap();
        cache.clear();

        // Load-through from the durable store sees the written slot
        let slot = StorageKey::from(U256::from(5));
        assert_eq!(
            cache.storage(addr(2), slot).unwrap().to_u256(),
            U256::from(77)
        );
    }

    #[test]
    fn test_checkpoint_wraps_a_whole_call_tree() {
        let mut cache = fresh_cache();
        cache.credit(addr(1), U256::from(1_000u64)).unwrap();
        cache
            .set_code(addr(2), Bytes::from_slice(&recursive_counter_code()))
            .unwrap();

        cache.checkpoint();
        {
            let recovery = K256Recovery;
            let mut dispatcher = dispatcher_for(&mut cache, &recovery);
            let result = dispatcher.call(CallMessage {
                caller: addr(1),
                target: addr(2),
                code_address: None,
                value: U256::from(3),
                data: Bytes::new(),
                gas_limit: 2_000_000,
                depth: 0,
            });
            assert!(result.is_success());
        }
        cache.revert().unwrap();

        // Observably equal to the pre-checkpoint state
        assert_eq!(cache.balance(addr(1)).unwrap(), U256::from(1_000));
        assert_eq!(cache.balance(addr(2)).unwrap(), U256::zero());
        assert!(cache
            .storage(addr(2), StorageKey::from(U256::zero()))
            .unwrap()
            .is_zero());
    }
}
