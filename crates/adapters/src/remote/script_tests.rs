// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cmdx_core::RemoteHost;

fn ctx(dir: &str) -> CommandContext {
    CommandContext::remote(RemoteHost::new("db1", "ops"), dir).unwrap()
}

fn ls() -> Invocation {
    Invocation::new("ls", vec!["-l".into()], "ls -l")
}

#[test]
fn plain_script_changes_directory_first() {
    assert_eq!(remote_script(&ls(), &ctx("/var/log")), "cd /var/log && ls -l");
}

#[test]
fn directory_with_spaces_is_quoted() {
    assert_eq!(remote_script(&ls(), &ctx("/srv/my data")), "cd '/srv/my data' && ls -l");
}

#[test]
fn privileged_env_is_set_inside_sudo() {
    let ctx =
        ctx("/").with_env("LC_ALL", "C").with_env("GREETING", "hi there").with_privileged(true);
    assert_eq!(
        remote_script(&ls(), &ctx),
        "cd / && sudo -n env 'GREETING=hi there' LC_ALL=C ls -l"
    );
}
