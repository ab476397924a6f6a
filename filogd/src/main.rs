/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) = filogd::opts::parse_clap()? else {
        return Ok(());
    };

    filogd::stdlog::setup(proc_args.verbose_level);

    let config = filogd::config::load(&proc_args.config_file).context(format!(
        "failed to load config file {}",
        proc_args.config_file.display()
    ))?;

    if proc_args.test_config {
        println!("the config file is valid");
        return Ok(());
    }

    let _daemon = filogd::spawn(config)?;

    // all work happens on the daemon threads
    loop {
        std::thread::park();
    }
}
