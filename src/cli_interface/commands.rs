//! run a parsed [KnixCli] against an image file and print the outcome
use std::io::Write;

use crate::{
    device::ImageFile,
    fs::{FileService, FsError, Layout},
    mkfs::mkfs,
    mount::mount,
};

use super::KnixCli;

/// Execute `cli`, writing its output to `out`.
///
/// File level failures (a missing file, a full table, ...) are reported
/// as text like the rest of the output. Failures to reach the image
/// come back as errors.
pub fn execute(cli: &KnixCli, out: &mut impl Write) -> anyhow::Result<()> {
    let image = cli.image();
    let layout = Layout::new(image.start_sector);
    if let KnixCli::Mkfs(_) = cli {
        let fs = mkfs(&image.image_file_path, layout)?;
        writeln!(
            out,
            "Created {} with {} free blocks.",
            image.image_file_path,
            fs.free_blocks()
        )?;
        return Ok(());
    }

    let mut fs = mount(&image.image_file_path, layout)?;
    match run(&mut fs, cli, out)? {
        Ok(()) => Ok(()),
        Err(e @ FsError::Io(_)) | Err(e @ FsError::Corrupt(_)) => Err(e.into()),
        Err(e) => {
            writeln!(out, "{}", describe(&e))?;
            Ok(())
        }
    }
}

/// the outer result carries output failures, the inner one file failures
fn run(
    fs: &mut FileService<ImageFile>,
    cli: &KnixCli,
    out: &mut impl Write,
) -> std::io::Result<Result<(), FsError>> {
    let result = match cli {
        KnixCli::Mkfs(_) => Ok(()),
        KnixCli::Ls(args) => {
            for stat in fs.list() {
                if args.long {
                    writeln!(
                        out,
                        "{}\t{} bytes\tMode: {}\tOwner: {}",
                        stat.name, stat.size, stat.mode, stat.owner
                    )?;
                } else {
                    writeln!(out, "{}", stat.name)?;
                }
            }
            Ok(())
        }
        KnixCli::Cat(args) => match fs.read_to_vec(&args.name) {
            Ok(content) => {
                out.write_all(&content)?;
                writeln!(out)?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        KnixCli::Write(args) => {
            let message = args.message();
            let result = if fs.find(&args.name).is_ok() {
                fs.update(&args.name, message.as_bytes())
            } else {
                fs.create(&args.name, message.as_bytes()).map(|_| ())
            };
            report(out, result, "File written successfully.")?
        }
        KnixCli::Cp(args) => {
            let result = fs.copy(&args.src, &args.dst).map(|_| ());
            report(out, result, "File copied successfully.")?
        }
        KnixCli::Mv(args) => {
            let result = fs.rename(&args.src, &args.dst);
            report(out, result, "File renamed successfully.")?
        }
        KnixCli::Rm(args) => {
            let result = fs.delete(&args.name);
            report(out, result, "File deleted successfully.")?
        }
        KnixCli::Chmod(args) => {
            let result = fs.chmod(&args.name, args.mode);
            report(out, result, "Mode changed successfully.")?
        }
        KnixCli::Chown(args) => {
            let result = fs.chown(&args.name, args.owner);
            report(out, result, "Owner changed successfully.")?
        }
        KnixCli::Stat(args) => match fs.stat(&args.name) {
            Ok(stat) => {
                writeln!(out, "Name: {}", stat.name)?;
                writeln!(out, "Size: {} bytes", stat.size)?;
                writeln!(out, "Hash: {}", stat.hash)?;
                writeln!(out, "Mode: {}", stat.mode)?;
                writeln!(out, "Owner: {}", stat.owner)?;
                writeln!(out, "Blocks: {:?}", stat.blocks)?;
                Ok(())
            }
            Err(e) => Err(e),
        },
        KnixCli::Touch(args) => {
            let result = fs.touch(&args.name).map(|_| ());
            report(out, result, "File creation (touch) successful.")?
        }
        KnixCli::Append(args) => {
            let result = fs.append(&args.name, args.message().as_bytes());
            report(out, result, "Message appended successfully.")?
        }
        KnixCli::Df(_) => {
            writeln!(out, "Number of blocks remaining: {}", fs.free_blocks())?;
            Ok(())
        }
        KnixCli::Find(args) => {
            let matches = fs.find_matching(&args.pattern);
            if matches.is_empty() {
                writeln!(out, "No matching files.")?;
            }
            for name in matches {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
    };
    Ok(result)
}

/// print `success` if `result` is ok, otherwise hand the error back
fn report(
    out: &mut impl Write,
    result: Result<(), FsError>,
    success: &str,
) -> std::io::Result<Result<(), FsError>> {
    if result.is_ok() {
        writeln!(out, "{success}")?;
    }
    Ok(result)
}

/// the user facing line for a file level failure
fn describe(e: &FsError) -> String {
    match e {
        FsError::NotFound => "File not found.".to_string(),
        FsError::AlreadyExists => "The file already exists.".to_string(),
        FsError::TableFull => "The file table is full.".to_string(),
        FsError::OutOfSpace => "Not enough free blocks.".to_string(),
        other => format!("Error: {other}."),
    }
}
