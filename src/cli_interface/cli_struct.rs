use clap::Parser;

use crate::fs::DEFAULT_START_SECTOR;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum KnixCli {
    /// create a new, empty KnixFS image file
    Mkfs(ImageArgs),
    /// list files
    Ls(LsArgs),
    /// print the content of a file
    Cat(NameArgs),
    /// write a message to a file, creating it if needed
    Write(MessageArgs),
    /// copy a file
    Cp(SrcDstArgs),
    /// rename a file
    Mv(SrcDstArgs),
    /// delete a file
    Rm(NameArgs),
    /// change the mode of a file
    Chmod(ChmodArgs),
    /// change the owner of a file
    Chown(ChownArgs),
    /// show the metadata of a file
    Stat(NameArgs),
    /// create an empty file
    Touch(NameArgs),
    /// add a message to the end of a file
    Append(MessageArgs),
    /// show the number of free blocks
    Df(ImageArgs),
    /// list files whose names contain a pattern
    Find(FindArgs),
}

/// where the image lives, shared by every subcommand
#[derive(clap::Args, Debug, PartialEq)]
pub struct ImageArgs {
    /// the path of the image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the sector the KnixFS region starts at
    #[clap(short, long, default_value_t = DEFAULT_START_SECTOR)]
    pub start_sector: u64,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct LsArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    /// show size, mode and owner
    #[clap(short = 'l')]
    pub long: bool,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct NameArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub name: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct MessageArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub name: String,
    /// words of the message, joined with single spaces
    #[clap(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

impl MessageArgs {
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct SrcDstArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub src: String,
    pub dst: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct ChmodArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub name: String,
    pub mode: u32,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct ChownArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub name: String,
    pub owner: u32,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct FindArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    pub pattern: String,
}

impl KnixCli {
    /// the image every subcommand works on
    pub fn image(&self) -> &ImageArgs {
        match self {
            KnixCli::Mkfs(args) | KnixCli::Df(args) => args,
            KnixCli::Ls(args) => &args.image,
            KnixCli::Cat(args) | KnixCli::Rm(args) | KnixCli::Stat(args) | KnixCli::Touch(args) => {
                &args.image
            }
            KnixCli::Write(args) | KnixCli::Append(args) => &args.image,
            KnixCli::Cp(args) | KnixCli::Mv(args) => &args.image,
            KnixCli::Chmod(args) => &args.image,
            KnixCli::Chown(args) => &args.image,
            KnixCli::Find(args) => &args.image,
        }
    }
}

/// test the `KnixCli` struct
/// test `mkfs` subcommand
#[cfg(test)]
mod mkfs_parse_args_tests {
    use super::*;
    /// test short parameter form
    #[test]
    fn test_short_parameter_form() {
        let args = KnixCli::parse_from(["knixfs", "mkfs", "-p", "test", "-s", "0"]);
        assert_eq!(
            args,
            KnixCli::Mkfs(ImageArgs {
                image_file_path: "test".to_string(),
                start_sector: 0,
            })
        );
    }
    /// test long parameter form
    #[test]
    fn test_long_parameter_form() {
        let image_file_path_name = concat!("--", "image-file-path");
        let args = KnixCli::parse_from([
            "knixfs",
            "mkfs",
            image_file_path_name,
            "test",
            "--start-sector",
            "200",
        ]);
        assert_eq!(
            args,
            KnixCli::Mkfs(ImageArgs {
                image_file_path: "test".to_string(),
                start_sector: 200,
            })
        );
    }
    /// the start sector defaults to 100
    #[test]
    fn test_default_start_sector() {
        let args = KnixCli::parse_from(["knixfs", "mkfs", "-p", "test"]);
        assert_eq!(args.image().start_sector, 100);
    }
}
