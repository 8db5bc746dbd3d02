//! savedcmd parsing
//!
//! Extracts the input files of the shell command a `.cmd` file recorded. An
//! ordered registry of (pattern, parser) pairs dispatches each single command
//! to a parser that knows that tool's argument shape; the first pattern that
//! matches the start of the command wins. Unmatched commands are reported,
//! with the severity picked by the strictness flag.

use regex::Regex;

use crate::cmd::{CmdParseError, CommandPart, Splitter, Token, Tokenizer};
use crate::report::{report_error, report_error_or_warning};

type ParserFn = fn(&SavedcmdParser, &str) -> Result<Vec<String>, CmdParseError>;

/// Linker options known to take no value. Everything else starting with `-`
/// follows the generic option rules of the tokenizer.
const LD_FLAG_OPTIONS: &[&str] = &[
    "-shared",
    "--no-undefined",
    "--eh-frame-hdr",
    "-Bsymbolic",
    "-r",
    "--no-ld-generated-unwind-info",
    "--no-dynamic-linker",
    "-pie",
    "--no-dynamic-linker--whole-archive",
    "--whole-archive",
    "--no-whole-archive",
    "--start-group",
    "--end-group",
];

pub struct SavedcmdParser {
    tokenizer: Tokenizer,
    splitter: Splitter,
    parsers: Vec<(Regex, ParserFn)>,
    compound_parsers: Vec<(Regex, ParserFn)>,
    /// `( ... ) >file` or `{ ... } >file` with the inner commands captured
    compound_group: Regex,
    /// `dd if=<input>`
    dd_input: Regex,
}

impl SavedcmdParser {
    pub fn new() -> Result<Self, regex::Error> {
        let parsers: Vec<(Regex, ParserFn)> = vec![
            // Compound commands
            (Regex::new(r"(?s)^\(.*?\)\s*>")?, Self::parse_compound as ParserFn),
            (Regex::new(r"(?s)^\{.*?\}\s*>")?, Self::parse_compound),
            // Standard Unix utilities and system tools
            (Regex::new(r"^rm\b")?, Self::parse_noop),
            (Regex::new(r"^mkdir\b")?, Self::parse_noop),
            (Regex::new(r"^touch\b")?, Self::parse_noop),
            (Regex::new(r"^cat\b.*?[\|>]")?, Self::parse_cat_before_pipe_or_redirect),
            (Regex::new(r"^echo[^|]*$")?, Self::parse_noop),
            (Regex::new(r"^sed.*?>")?, Self::parse_sed_before_redirect),
            (Regex::new(r"^sed\b")?, Self::parse_noop),
            (Regex::new(r"^awk.*?<.*?>")?, Self::parse_awk_between_redirects),
            (Regex::new(r"^awk.*?>")?, Self::parse_awk_before_redirect),
            (Regex::new(r"^(/bin/)?true\b")?, Self::parse_noop),
            (Regex::new(r"^(/bin/)?false\b")?, Self::parse_noop),
            (Regex::new(r"^openssl\s+req.*?-new.*?-keyout")?, Self::parse_noop),
            // Compilers and code generators
            // (C/LLVM toolchain, Rust, Flex/Bison, Bindgen, Perl, etc.)
            (Regex::new(r"^([^\s]+-)?(gcc|clang)\b")?, Self::parse_gcc_or_clang),
            (Regex::new(r"^([^\s]+-)?ld(\.bfd)?\b")?, Self::parse_ld),
            (Regex::new(r"^printf\b.*\| xargs ([^\s]+-)?ar\b")?, Self::parse_ar_piped_xargs),
            (Regex::new(r"^([^\s]+-)?ar\b")?, Self::parse_ar),
            (Regex::new(r"^([^\s]+-)?nm\b.*?\|")?, Self::parse_nm_piped),
            (Regex::new(r"^([^\s]+-)?objcopy\b")?, Self::parse_objcopy),
            (Regex::new(r"^([^\s]+-)?strip\b")?, Self::parse_strip),
            (Regex::new(r"^.*?rustc\b")?, Self::parse_rustc),
            (Regex::new(r"^.*?rustdoc\b")?, Self::parse_rustdoc),
            (Regex::new(r"^flex\b")?, Self::parse_flex),
            (Regex::new(r"^bison\b")?, Self::parse_bison),
            (Regex::new(r"^bindgen\b")?, Self::parse_bindgen),
            (Regex::new(r"^perl\b")?, Self::parse_perl),
            // Kernel-specific build scripts and tools
            (Regex::new(r"^(.*/)?link-vmlinux\.sh\b")?, Self::parse_link_vmlinux),
            (Regex::new(r"^sh (.*/)?syscallhdr\.sh\b")?, Self::parse_syscallhdr),
            (Regex::new(r"^sh (.*/)?syscalltbl\.sh\b")?, Self::parse_syscalltbl),
            (Regex::new(r"^sh (.*/)?mkcapflags\.sh\b")?, Self::parse_mkcapflags),
            (Regex::new(r"^sh (.*/)?orc_hash\.sh\b")?, Self::parse_orc_hash),
            (Regex::new(r"^sh (.*/)?xen-hypercalls\.sh\b")?, Self::parse_xen_hypercalls),
            (Regex::new(r"^sh (.*/)?gen_initramfs\.sh\b")?, Self::parse_gen_initramfs),
            (Regex::new(r"^sh (.*/)?checkundef\.sh\b")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?vdso2c\b")?, Self::parse_vdso2c),
            (Regex::new(r"^(.*/)?mkpiggy.*?>")?, Self::parse_mkpiggy),
            (Regex::new(r"^(.*/)?relocs\b")?, Self::parse_relocs),
            (Regex::new(r"^(.*/)?mk_elfconfig.*?<.*?>")?, Self::parse_mk_elfconfig),
            (Regex::new(r"^(.*/)?tools/build\b")?, Self::parse_tools_build),
            (Regex::new(r"^(.*/)?certs/extract-cert")?, Self::parse_extract_cert),
            (Regex::new(r"^(.*/)?scripts/dtc/dtc\b")?, Self::parse_dtc),
            (Regex::new(r"^(.*/)?pnmtologo\b")?, Self::parse_pnmtologo),
            (Regex::new(r"^(.*/)?kernel/pi/relacheck")?, Self::parse_relacheck),
            (Regex::new(r"^drivers/gpu/drm/radeon/mkregtable")?, Self::parse_mkregtable),
            (Regex::new(r"^(.*/)?genheaders\b")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?mkcpustr\s+>")?, Self::parse_noop),
            (Regex::new(r"^(.*/)polgen\b")?, Self::parse_noop),
            (Regex::new(r"^make -f .*/arch/x86/Makefile\.postlink")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?raid6/mktables\s+>")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?objtool\b")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?module/gen_test_kallsyms\.sh")?, Self::parse_noop),
            (Regex::new(r"^(.*/)?gen_header\.py")?, Self::parse_gen_header),
            (Regex::new(r"^(.*/)?scripts/rustdoc_test_gen")?, Self::parse_noop),
        ];

        let compound_parsers: Vec<(Regex, ParserFn)> = vec![
            (Regex::new(r"^dd\b")?, Self::parse_dd as ParserFn),
            (Regex::new(r"^cat.*?\|")?, Self::parse_cat_before_pipe),
            (Regex::new(r"^cat\b[^|>]*$")?, Self::parse_cat),
            (Regex::new(r"^echo\b")?, Self::parse_noop),
            (Regex::new(r"^\S+=")?, Self::parse_noop),
            (Regex::new(r"^printf\b")?, Self::parse_noop),
            (Regex::new(r"^sed\b")?, Self::parse_sed),
            (Regex::new(r"^(.*/)scripts/bin2c\s*<")?, Self::parse_bin2c),
            (Regex::new(r"^:$")?, Self::parse_noop),
        ];

        Ok(Self {
            tokenizer: Tokenizer::new()?,
            splitter: Splitter::new()?,
            parsers,
            compound_parsers,
            compound_group: Regex::new(r"(?s)^\s*[\(\{](.*)[\)\}]\s*>")?,
            dd_input: Regex::new(r"^dd.*?if=(\S+)")?,
        })
    }

    /// Extract the input files referenced by a composite command string.
    ///
    /// Problems never abort the walk: unknown commands and parser rejections
    /// are reported (severity per `fail_on_unknown_build_command`) and the
    /// affected command contributes no inputs.
    pub fn parse_inputs(&self, commands: &str, fail_on_unknown_build_command: bool) -> Vec<String> {
        let strict = fail_on_unknown_build_command;
        let mut input_files: Vec<String> = Vec::new();
        for part in self.splitter.split(commands) {
            let single_command = match part {
                CommandPart::If(block) => {
                    let inputs = self.parse_inputs(&block.then_statement, strict);
                    if !inputs.is_empty() {
                        report_error_or_warning!(
                            strict,
                            "Skipped parsing command {} because input files in IfBlock 'then' statement are not supported",
                            block.then_statement
                        );
                    }
                    continue;
                }
                CommandPart::Single(single_command) => single_command,
            };

            let matched_parser = self
                .parsers
                .iter()
                .find(|(pattern, _)| pattern.is_match(&single_command))
                .map(|(_, parser)| parser);
            let Some(parser) = matched_parser else {
                report_error_or_warning!(
                    strict,
                    "Skipped parsing command {} because no matching parser was found",
                    single_command
                );
                continue;
            };
            match parser(self, &single_command) {
                Ok(inputs) => input_files.extend(inputs),
                Err(e) => report_error_or_warning!(
                    strict,
                    "Skipped parsing command {} because of command parsing error: {}",
                    single_command,
                    e
                ),
            }
        }

        input_files
            .iter()
            .map(|input| input.trim().trim_end_matches('/').to_string())
            .collect()
    }

    /// `( ... ) >file` and `{ ... } >file` groups: re-enter with a restricted
    /// registry of the commands observed inside such groups.
    fn parse_compound(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let inner_commands = self
            .compound_group
            .captures(command)
            .map(|captures| captures[1].to_string())
            .ok_or_else(|| CmdParseError("No inner commands found for compound command".to_string()))?;

        let mut input_files = Vec::new();
        for inner in self.splitter.split(&inner_commands) {
            let inner_command = match inner {
                CommandPart::If(block) => {
                    report_error!(
                        "Skip parsing inner command `if {}; then {}; fi` of compound command because IfBlock is not supported",
                        block.condition,
                        block.then_statement
                    );
                    continue;
                }
                CommandPart::Single(inner_command) => inner_command,
            };

            let matched_parser = self
                .compound_parsers
                .iter()
                .find(|(pattern, _)| pattern.is_match(&inner_command))
                .map(|(_, parser)| parser);
            let Some(parser) = matched_parser else {
                report_error!(
                    "Skip parsing inner command {} of compound command because no matching parser was found",
                    inner_command
                );
                continue;
            };
            match parser(self, &inner_command) {
                Ok(inputs) => input_files.extend(inputs),
                Err(e) => report_error!(
                    "Skip parsing inner command {} of compound command because of command parsing error: {}",
                    inner_command,
                    e
                ),
            }
        }
        Ok(input_files)
    }

    fn parse_noop(&self, _command: &str) -> Result<Vec<String>, CmdParseError> {
        Ok(Vec::new())
    }

    fn parse_dd(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        Ok(self
            .dd_input
            .captures(command)
            .map(|captures| vec![captures[1].to_string()])
            .unwrap_or_default())
    }

    fn parse_cat(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["cat", input1, input2, ...]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(positionals.get(1..).unwrap_or_default().to_vec())
    }

    fn parse_cat_before_pipe(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.parse_cat(before(command, '|'))
    }

    fn parse_cat_before_pipe_or_redirect(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.parse_cat(before(before(command, '|'), '>'))
    }

    fn parse_sed(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect command parts to be ["sed", *, input]
        let parts = shell_split(command)?;
        let input = last(&parts, command)?;
        if input == "/dev/null" {
            return Ok(Vec::new());
        }
        Ok(vec![input])
    }

    fn parse_sed_before_redirect(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.parse_sed(before(command, '>'))
    }

    fn parse_awk(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["awk", input1, input2, ...]
        let positionals = self.positionals(command, &[])?;
        Ok(positionals.get(1..).unwrap_or_default().to_vec())
    }

    fn parse_awk_before_redirect(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.parse_awk(before(command, '>'))
    }

    fn parse_awk_between_redirects(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let input = before(after(command, '<'), '>');
        Ok(vec![input.to_string()])
    }

    fn parse_bin2c(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let input = after(command, '<').trim();
        if input == "/dev/null" {
            return Ok(Vec::new());
        }
        Ok(vec![input.to_string()])
    }

    fn parse_objcopy(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let positionals = self.positionals(command, &["-S", "-w"])?;
        // expect positionals to be ['objcopy', input_file] or ['objcopy', input_file, output_file]
        if !(positionals.len() == 2 || positionals.len() == 3) {
            return Err(CmdParseError(format!(
                "Invalid objcopy command format: expected 2 or 3 positional arguments, got {} ({:?})",
                positionals.len(),
                positionals
            )));
        }
        Ok(vec![positionals[1].clone()])
    }

    /// The `scripts/link-vmlinux.sh` script is not parsed; its `vmlinux.a`
    /// input is a known constant of the script.
    fn parse_link_vmlinux(&self, _command: &str) -> Result<Vec<String>, CmdParseError> {
        Ok(vec!["vmlinux.a".to_string()])
    }

    fn parse_ar(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ['ar', flags, output, input1, input2, ...]
        let positionals = self.tokenizer.positionals_only(command)?;
        let flags = positional(&positionals, 1, command)?;
        if !flags.contains('r') {
            // 'r' indicates that new files are added to the archive. Without
            // it there are no relevant input files.
            return Ok(Vec::new());
        }
        Ok(positionals.get(3..).unwrap_or_default().to_vec())
    }

    fn parse_ar_piped_xargs(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let printf_command = before(command, '|').trim();
        // expect positionals to be ['printf', '{prefix_path}%s ', input1, input2, ...]
        let positionals = self.tokenizer.positionals_only(printf_command)?;
        let prefix_path = positional(&positionals, 1, command)?;
        let prefix_path = prefix_path.trim_end_matches(['%', 's', ' ']);
        Ok(positionals
            .get(2..)
            .unwrap_or_default()
            .iter()
            .map(|filename| format!("{}{}", prefix_path, filename))
            .collect())
    }

    fn parse_gcc_or_clang(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let parts = shell_split(command)?;
        // compile mode: the last positional argument ending in `.c` or `.S` is the input
        for part in parts.iter().rev() {
            if !part.starts_with('-') && (part.ends_with(".c") || part.ends_with(".S")) {
                return Ok(vec![part.clone()]);
            }
        }
        // linking mode: all `.o` arguments are the inputs
        Ok(parts.into_iter().filter(|part| part.ends_with(".o")).collect())
    }

    fn parse_rustc(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.last_rust_source(command)
    }

    fn parse_rustdoc(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        self.last_rust_source(command)
    }

    fn last_rust_source(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let parts = shell_split(command)?;
        // expect the last positional argument ending in `.rs` to be the input
        for part in parts.iter().rev() {
            if !part.starts_with('-') && part.ends_with(".rs") {
                return Ok(vec![part.clone()]);
            }
        }
        Err(CmdParseError("Could not find .rs input source file".to_string()))
    }

    fn parse_flex(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let parts = shell_split(command)?;
        // expect the last positional argument ending in `.l` to be the input
        for part in parts.iter().rev() {
            if !part.starts_with('-') && part.ends_with(".l") {
                return Ok(vec![part.clone()]);
            }
        }
        Err(CmdParseError("Could not find .l input source file in command".to_string()))
    }

    fn parse_bison(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let parts = shell_split(command)?;
        // expect the last positional argument ending in `.y` to be the input
        for part in parts.iter().rev() {
            if !part.starts_with('-') && part.ends_with(".y") {
                return Ok(vec![part.clone()]);
            }
        }
        Err(CmdParseError("Could not find .y input source file in command".to_string()))
    }

    fn parse_bindgen(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let parts = shell_split(command)?;
        Ok(parts.into_iter().filter(|part| part.ends_with(".h")).collect())
    }

    fn parse_perl(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["perl", input]
        let positionals = self.tokenizer.positionals_only(command.trim())?;
        Ok(vec![positional(&positionals, 1, command)?])
    }

    fn parse_syscallhdr(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/syscallhdr.sh, input, output]
        let positionals = self.positionals(command.trim(), &["--emit-nr"])?;
        Ok(vec![positional(&positionals, 2, command)?])
    }

    fn parse_syscalltbl(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/syscalltbl.sh, input, output]
        let positionals = self.positionals(command.trim(), &[])?;
        Ok(vec![positional(&positionals, 2, command)?])
    }

    fn parse_mkcapflags(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/mkcapflags.sh, output, input1, input2]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(vec![
            positional(&positionals, 3, command)?,
            positional(&positionals, 4, command)?,
        ])
    }

    fn parse_orc_hash(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/orc_hash.sh, '<', input, '>', output]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(vec![positional(&positionals, 3, command)?])
    }

    fn parse_xen_hypercalls(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/xen-hypercalls.sh, output, input1, input2, ...]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(positionals.get(3..).unwrap_or_default().to_vec())
    }

    fn parse_gen_initramfs(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["sh", path/to/gen_initramfs.sh, input1, input2, ...]
        let positionals = self.positionals(command, &[])?;
        Ok(positionals.get(2..).unwrap_or_default().to_vec())
    }

    fn parse_vdso2c(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ['vdso2c', raw_input, stripped_input, output]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(vec![
            positional(&positionals, 1, command)?,
            positional(&positionals, 2, command)?,
        ])
    }

    fn parse_ld(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["ld", input1, input2, ...]
        let positionals = self.positionals(command.trim(), LD_FLAG_OPTIONS)?;
        Ok(positionals.get(1..).unwrap_or_default().to_vec())
    }

    fn parse_nm_piped(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["nm", input1, input2, ...]
        let nm_command = before(command, '|').trim();
        let positionals = self.positionals(nm_command, &["p", "--defined-only"])?;
        Ok(positionals.get(1..).unwrap_or_default().to_vec())
    }

    fn parse_pnmtologo(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect command parts to be ["pnmtologo", <options>, input]
        let parts = shell_split(command)?;
        Ok(vec![last(&parts, command)?])
    }

    fn parse_relacheck(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["relacheck", input, log_reference]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(vec![positional(&positionals, 1, command)?])
    }

    fn parse_strip(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["strip", input1, input2, ...]
        let positionals = self.positionals(command, &["--strip-debug"])?;
        Ok(positionals.get(1..).unwrap_or_default().to_vec())
    }

    fn parse_mkpiggy(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["mkpiggy", input]
        let positionals = self.tokenizer.positionals_only(before(command, '>'))?;
        Ok(vec![positional(&positionals, 1, command)?])
    }

    fn parse_relocs(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        if !command.contains('>') {
            // Without a redirection no output file is produced, so there is
            // no input we care about.
            return Ok(Vec::new());
        }
        // expect command parts to be ["relocs", options, input]
        let parts = shell_split(before(command, '>'))?;
        Ok(vec![last(&parts, command)?])
    }

    fn parse_mk_elfconfig(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["mk_elfconfig", "<", input, ">", output]
        let positionals = self.tokenizer.positionals_only(command)?;
        Ok(vec![positional(&positionals, 2, command)?])
    }

    fn parse_tools_build(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be ["tools/build", input1, input2, input3, output]
        let positionals = self.tokenizer.positionals_only(command)?;
        if positionals.len() < 2 {
            return Err(CmdParseError(format!(
                "Invalid tools/build command format: expected inputs and an output in command {}",
                command
            )));
        }
        Ok(positionals[1..positionals.len() - 1].to_vec())
    }

    fn parse_extract_cert(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect command parts to be [path/to/extract-cert, input, output]
        let parts = shell_split(command)?;
        let input = positional(&parts, 1, command)?;
        if input.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![input])
    }

    fn parse_dtc(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect positionals to be [path/to/dtc, input]
        let wno_flags: Vec<String> = shell_split(command)?
            .into_iter()
            .filter(|part| part.starts_with("-Wno-"))
            .collect();
        let wno_flags: Vec<&str> = wno_flags.iter().map(String::as_str).collect();
        let positionals = self.positionals(command, &wno_flags)?;
        Ok(vec![positional(&positionals, 1, command)?])
    }

    fn parse_mkregtable(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let mut parts = command.split(' ');
        parts
            .nth(1)
            .map(|input| vec![input.to_string()])
            .ok_or_else(|| CmdParseError(format!("Could not find input in command {}", command)))
    }

    fn parse_gen_header(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        // expect command parts to be ["python3", path/to/gen_header.py, ..., "--xml", input]
        let parts = shell_split(command)?;
        let xml = parts
            .iter()
            .position(|part| part == "--xml")
            .ok_or_else(|| CmdParseError(format!("Could not find --xml option in command {}", command)))?;
        Ok(vec![positional(&parts, xml + 1, command)?])
    }

    /// Tokenize and keep the positionals, allowing options to be present.
    fn positionals(&self, command: &str, flag_options: &[&str]) -> Result<Vec<String>, CmdParseError> {
        Ok(self
            .tokenizer
            .tokenize(command, flag_options)?
            .into_iter()
            .filter_map(|token| match token {
                Token::Positional(value) => Some(value),
                Token::Opt { .. } => None,
            })
            .collect())
    }
}

fn shell_split(command: &str) -> Result<Vec<String>, CmdParseError> {
    shell_words::split(command).map_err(|e| CmdParseError(format!("{} in command {}", e, command)))
}

/// The part of `command` before the first occurrence of `separator`, or the
/// whole command if it does not occur.
fn before(command: &str, separator: char) -> &str {
    command.split(separator).next().unwrap_or(command)
}

/// The part of `command` after the first occurrence of `separator`.
fn after(command: &str, separator: char) -> &str {
    command.split_once(separator).map(|(_, rest)| rest).unwrap_or("")
}

fn positional(positionals: &[String], index: usize, command: &str) -> Result<String, CmdParseError> {
    positionals.get(index).cloned().ok_or_else(|| {
        CmdParseError(format!(
            "Invalid command format: expected at least {} positional arguments in command {}",
            index + 1,
            command
        ))
    })
}

fn last(parts: &[String], command: &str) -> Result<String, CmdParseError> {
    parts
        .last()
        .cloned()
        .ok_or_else(|| CmdParseError(format!("Invalid command format: empty command {}", command)))
}
