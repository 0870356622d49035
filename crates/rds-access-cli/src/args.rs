// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rds_access_core::{Action, AssignmentStatus};

/// rds-access - grant and revoke identity-based RDS access.
#[derive(Parser, Debug)]
#[command(
	name = "rds-access",
	about = "Grant and revoke identity-based RDS access",
	version
)]
pub struct Args {
	/// Config file (default: /etc/rds-access/provider.toml)
	#[arg(long, global = true, env = "RDS_ACCESS_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Perform exactly one invocation and print the progress event
	Invoke {
		#[arg(value_enum)]
		action: ActionArg,

		/// Subject (directory username) the grant is for
		#[arg(long)]
		subject: String,

		/// Continuation context returned by the previous invocation
		#[arg(long)]
		context: Option<String>,

		/// Artifact id to reconcile on read (deprecated; the persisted record is used when omitted)
		#[arg(long)]
		artifact_id: Option<String>,
	},

	/// Re-invoke until the operation reaches a terminal state
	Drive {
		#[arg(value_enum)]
		action: DriveAction,

		#[arg(long)]
		subject: String,

		#[arg(long, default_value_t = 30)]
		max_invocations: u32,
	},

	/// Inspect or seed the local sandbox
	Sandbox {
		#[command(subcommand)]
		command: SandboxCommand,
	},
}

#[derive(Subcommand, Debug)]
pub enum SandboxCommand {
	/// Register a directory user
	AddUser {
		#[arg(long)]
		username: String,

		#[arg(long)]
		principal_id: Option<String>,
	},

	/// Settle a pending assignment or deassignment by hand
	Settle {
		#[arg(long)]
		request_id: String,

		#[arg(value_enum)]
		status: SettleStatus,
	},

	/// Print the sandbox state
	Show,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
	Create,
	Read,
	Delete,
}

impl From<ActionArg> for Action {
	fn from(arg: ActionArg) -> Self {
		match arg {
			ActionArg::Create => Action::Create,
			ActionArg::Read => Action::Read,
			ActionArg::Delete => Action::Delete,
		}
	}
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveAction {
	Create,
	Delete,
}

impl From<DriveAction> for Action {
	fn from(arg: DriveAction) -> Self {
		match arg {
			DriveAction::Create => Action::Create,
			DriveAction::Delete => Action::Delete,
		}
	}
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
	Succeeded,
	Failed,
}

impl From<SettleStatus> for AssignmentStatus {
	fn from(status: SettleStatus) -> Self {
		match status {
			SettleStatus::Succeeded => AssignmentStatus::Succeeded,
			SettleStatus::Failed => AssignmentStatus::Failed,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_invoke_with_context() {
		let args = Args::try_parse_from([
			"rds-access",
			"invoke",
			"create",
			"--subject",
			"alice",
			"--context",
			r#"{"assignmentRequestId":"req-1"}"#,
		])
		.unwrap();

		match args.command {
			Command::Invoke {
				action,
				subject,
				context,
				artifact_id,
			} => {
				assert_eq!(Action::from(action), Action::Create);
				assert_eq!(subject, "alice");
				assert!(context.unwrap().contains("req-1"));
				assert!(artifact_id.is_none());
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn config_flag_is_global() {
		let args = Args::try_parse_from([
			"rds-access",
			"sandbox",
			"show",
			"--config",
			"/tmp/provider.toml",
		])
		.unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/provider.toml")));
		assert!(matches!(
			args.command,
			Command::Sandbox {
				command: SandboxCommand::Show
			}
		));
	}

	#[test]
	fn drive_rejects_read() {
		let parsed = Args::try_parse_from(["rds-access", "drive", "read", "--subject", "alice"]);
		assert!(parsed.is_err());
	}

	#[test]
	fn drive_defaults_invocation_cap() {
		let args =
			Args::try_parse_from(["rds-access", "drive", "delete", "--subject", "alice"]).unwrap();
		assert!(matches!(
			args.command,
			Command::Drive {
				action: DriveAction::Delete,
				max_invocations: 30,
				..
			}
		));
	}
}
