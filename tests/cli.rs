use clap::Parser;
use flatsplit::cli::{Cli, Commands, DistributeArgs, FlattenArgs, TreeArgs};
use flatsplit::core::flatten::CollisionPolicy;
use flatsplit::core::segment::AliasRule;

#[test]
fn flatten_flag_parsing()
{
    // Given
    let argv = vec![
        "fsp",
        "flatten",
        "backend",
        "-o",
        "flat",
        "--on-collision",
        "rename-with-suffix",
        "--include",
        "**/*.ts",
        "--keep-comments",
        "--json",
    ];

    // When
    let cmd = Cli::parse_from(argv);

    // Then
    match cmd.command
    {
        Commands::Flatten(FlattenArgs {
            root,
            out,
            on_collision,
            include,
            keep_comments,
            json,
            strict,
            ..
        }) =>
        {
            assert_eq!(root.to_string_lossy(), "backend");
            assert_eq!(out.expect("out captured").to_string_lossy(), "flat");
            assert_eq!(on_collision, Some(CollisionPolicy::RenameWithSuffix));
            assert_eq!(include, vec!["**/*.ts".to_string()]);
            assert!(keep_comments && json && !strict);
        }
        _ => panic!("expected Flatten command"),
    }
}

#[test]
fn flatten_defaults_leave_config_in_charge()
{
    let cmd = Cli::parse_from(["fsp", "flatten"]);

    match cmd.command
    {
        Commands::Flatten(args) =>
        {
            assert_eq!(args.root.to_string_lossy(), ".");
            assert!(args.out.is_none());
            assert!(args.on_collision.is_none());
        }
        _ => panic!("expected Flatten command"),
    }
}

#[test]
fn from_list_and_dir_are_exclusive()
{
    let res = Cli::try_parse_from(["fsp", "flatten", "--from-list", "l.txt", "--dir", "types"]);
    assert!(res.is_err());
}

#[test]
fn distribute_aliases_are_parsed()
{
    let cmd = Cli::parse_from([
        "fsp",
        "distribute",
        "-g",
        "gen",
        "-b",
        "server",
        "--alias",
        "@/=lib/",
        "--alias",
        "~/=src/",
        "--strict",
    ]);

    match cmd.command
    {
        Commands::Distribute(DistributeArgs { generated, target, alias, strict, .. }) =>
        {
            assert_eq!(generated.expect("generated").to_string_lossy(), "gen");
            assert_eq!(target.expect("target").to_string_lossy(), "server");
            assert_eq!(
                alias,
                vec![AliasRule::new("@/", "lib/"), AliasRule::new("~/", "src/")]
            );
            assert!(strict);
        }
        _ => panic!("expected Distribute command"),
    }
}

#[test]
fn malformed_alias_is_rejected()
{
    let res = Cli::try_parse_from(["fsp", "distribute", "--alias", "nope"]);
    assert!(res.is_err());
}

#[test]
fn tree_requires_a_name()
{
    assert!(Cli::try_parse_from(["fsp", "tree"]).is_err());

    let cmd = Cli::parse_from(["fsp", "tree", "components", "hooks", "--depth", "2"]);
    match cmd.command
    {
        Commands::Tree(TreeArgs { names, depth, .. }) =>
        {
            assert_eq!(names, vec!["components".to_string(), "hooks".to_string()]);
            assert_eq!(depth, Some(2));
        }
        _ => panic!("expected Tree command"),
    }
}

#[test]
fn global_flags_work_after_the_subcommand()
{
    let cmd = Cli::parse_from(["fsp", "distribute", "--dry-run", "-v", "--no-color"]);
    assert!(cmd.dry_run && cmd.verbose && cmd.no_color);
    assert!(!cmd.quiet);
}
