// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: 2026 Bastion Contributors

#![no_main]

use bastion_core::ConnectionDescriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(descriptor) = ConnectionDescriptor::parse(s)
    {
        assert!(!descriptor.host().is_empty());
        if descriptor.password().is_some() {
            assert!(format!("{descriptor:?}").contains("[REDACTED]"));
        }
    }
});
