// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod provider;
mod sandbox;

pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use provider::ProviderConfigLayer;
pub use sandbox::{
	SandboxConfig, SandboxConfigLayer, DEFAULT_POLLS_UNTIL_SETTLED, DEFAULT_STATE_PATH,
};
