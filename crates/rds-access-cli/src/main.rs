// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! rds-access binary: invoke the provider against a local sandbox.
//!
//! stdout carries only progress-event or sandbox JSON; logs go to stderr.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rds_access_config::{LogFormat, LoggingConfig, RdsAccessConfig};
use rds_access_core::{
	AccessProvider, ContinuationContext, HandlerRequest, OperationStatus, ProgressEvent,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod driver;
mod sandbox;

use args::{Args, Command, SandboxCommand};
use sandbox::Sandbox;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => rds_access_config::load_config_with_file(path),
		None => rds_access_config::load_config(),
	}
	.context("loading configuration")?;

	init_tracing(&config.logging);

	match args.command {
		Command::Invoke {
			action,
			subject,
			context,
			artifact_id,
		} => {
			let context = ContinuationContext::from_json_str(context.as_deref().unwrap_or_default())
				.context("parsing --context")?;
			let mut request = HandlerRequest::new(action.into(), subject).with_context(context);
			if let Some(id) = artifact_id {
				request = request.with_artifact_id(id);
			}

			let sandbox = open_sandbox(&config)?;
			let provider = AccessProvider::new(config.provider.clone(), sandbox.adapters());
			let event = provider.handle(&request).await;
			sandbox.save()?;
			print_event(&event)
		}
		Command::Drive {
			action,
			subject,
			max_invocations,
		} => {
			let sandbox = open_sandbox(&config)?;
			let provider = AccessProvider::new(config.provider.clone(), sandbox.adapters());
			let outcome = driver::drive(&provider, action.into(), &subject, max_invocations).await;
			sandbox.save()?;

			let outcome = outcome?;
			if outcome.exhausted() {
				warn!(invocations = outcome.invocations, "gave up before a terminal status");
			} else {
				info!(
					invocations = outcome.invocations,
					status = %outcome.event.status,
					"drive finished"
				);
			}
			print_event(&outcome.event)
		}
		Command::Sandbox { command } => {
			let sandbox = open_sandbox(&config)?;
			match command {
				SandboxCommand::AddUser {
					username,
					principal_id,
				} => {
					let principal_id = principal_id.unwrap_or_else(|| format!("user-{username}"));
					info!(
						username = %username,
						principal_id = %principal_id,
						"adding directory user"
					);
					sandbox.directory.add_user(username, principal_id);
					sandbox.save()?;
				}
				SandboxCommand::Settle { request_id, status } => {
					anyhow::ensure!(
						sandbox.authorization.set_operation_status(&request_id, status.into()),
						"no operation with request id {request_id}"
					);
					sandbox.save()?;
				}
				SandboxCommand::Show => {
					println!("{}", serde_json::to_string_pretty(&sandbox.snapshot())?);
				}
			}
			Ok(ExitCode::SUCCESS)
		}
	}
}

fn open_sandbox(config: &RdsAccessConfig) -> anyhow::Result<Sandbox> {
	let sandbox = Sandbox::open(&config.sandbox, &config.provider)?;
	info!(path = %sandbox.path().display(), "using sandbox");
	Ok(sandbox)
}

fn print_event(event: &ProgressEvent) -> anyhow::Result<ExitCode> {
	println!("{}", serde_json::to_string_pretty(event)?);
	Ok(match event.status {
		OperationStatus::Failed => ExitCode::FAILURE,
		OperationStatus::InProgress | OperationStatus::Success => ExitCode::SUCCESS,
	})
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}
