pub mod args;
pub mod diagnostics;
pub mod driver;
pub mod ext;
pub mod filter;
pub mod keys;
pub mod pack;
pub mod pad;
pub mod plugin;
pub mod preset;
pub mod remap;
pub mod types;
pub mod utils;
pub mod walker;

use args::{BuildArgs, CliArchiveFormat, Command};
use clap::Parser;
use diagnostics::Severity;
use driver::{ArchiveFormat, Driver, FsProject};
use pack::emitter::{EngineVersion, PackOptions};
use plugin::PluginPipeline;
use std::fs::File;
use std::io::{Seek, SeekFrom};

fn run_build(build: &BuildArgs) -> anyhow::Result<diagnostics::BuildReport> {
    let platform = preset::lookup_platform(&build.platform)?;

    let loaded_preset;
    let preset = if let (Some(preset_file), Some(preset_name)) = (&build.preset_file, &build.preset_name) {
        let contents = std::fs::read_to_string(preset_file)?;
        let ini = ini::Ini::load_from_str(&contents)?;
        loaded_preset = find_preset_by_name(&ini, preset_name)?;
        &loaded_preset
    } else {
        loaded_preset = preset_from_flags(build);
        &loaded_preset
    };

    let project = FsProject::new(build.project.clone());
    let plugins = PluginPipeline::new(Vec::new());
    let mut driver = Driver::new(preset, platform.as_ref(), &project, &project, plugins, build.debug);

    let output_path = build.project.join(&build.output);
    let report = match build.format {
        CliArchiveFormat::Pck => {
            let options = PackOptions {
                engine_version: EngineVersion { major: 4, minor: 0, patch: 0 },
                enc_pck: build.enc_pck,
                enc_directory: build.enc_directory,
                key: keys::decode_key(&build.enc_key),
                body_include: filter::GlobList::parse(&build.enc_include),
                body_exclude: filter::GlobList::parse(&build.enc_exclude),
                padding_fn: pad::fill_padding,
                embed: build.embed.is_some(),
            };
            if let Some(exe_path) = &build.embed {
                std::fs::copy(exe_path, &output_path)?;
                let mut dest = File::options().read(true).write(true).open(&output_path)?;
                dest.seek(SeekFrom::End(0))?;
                driver.run(dest, ArchiveFormat::Pck(options), None)?
            } else {
                let dest = File::create(&output_path)?;
                driver.run(dest, ArchiveFormat::Pck(options), None)?
            }
        }
        CliArchiveFormat::Zip => {
            let dest = File::create(&output_path)?;
            driver.run(dest, ArchiveFormat::Zip, None)?
        }
    };

    Ok(report)
}

fn preset_from_flags(build: &BuildArgs) -> preset::Preset {
    preset::Preset {
        name: "cli".to_string(),
        platform_id: build.platform.clone(),
        export_filter: build.filter.into(),
        selected_files: build.selected.iter().map(|s| types::ResourcePath::new(s.clone())).collect(),
        include_filter: build.include.clone(),
        exclude_filter: build.exclude.clone(),
        custom_features: build.features.clone(),
        enc_pck: build.enc_pck,
        enc_directory: build.enc_directory,
        enc_in_filter: build.enc_include.clone(),
        enc_ex_filter: build.enc_exclude.clone(),
        script_encryption_key: build.enc_key.clone(),
        export_path: build.output.clone(),
        icon_path: build.icon_path.clone(),
        boot_splash_path: build.boot_splash_path.clone(),
        uid_cache_path: build.uid_cache_path.clone(),
        extension_list_path: build.extension_list_path.clone(),
        text_server_data_path: build.text_server_data_path.clone(),
    }
}

fn find_preset_by_name(ini: &ini::Ini, name: &str) -> anyhow::Result<preset::Preset> {
    for index in 0..256 {
        match preset::load_preset(ini, index) {
            Ok(candidate) if candidate.name == name => return Ok(candidate),
            Ok(_) => continue,
            Err(_) => break,
        }
    }
    anyhow::bail!("no preset named '{name}' found")
}

fn main() {
    let args = args::Args::parse();
    let Command::Build(build) = args.command;

    match run_build(&build) {
        Ok(report) => {
            println!("{report}");
            for message in &report.messages {
                if build.verbose || message.severity != Severity::Info {
                    eprintln!("{message}");
                }
            }
        }
        Err(err) => {
            eprintln!("Error building archive: {err}");
            if std::env::var("RUST_BACKTRACE").is_ok() {
                eprintln!("Backtrace: {}", err.backtrace());
            }
            std::process::exit(1);
        }
    }
}
