// Runtime program synthesis: wraps script code in a compilable program.
//
// The generated unit imports the default namespaces followed by the script's
// own namespaces, then splices the user's code, unmodified, into a guarded
// async entry method whose failures are captured in `Program.Exception`.

use std::collections::HashSet;

use crate::types::ScriptConfig;

/// Namespaces every synthesized program imports, in emission order.
pub const DEFAULT_NAMESPACES: &[&str] = &[
    "System",
    "System.IO",
    "System.Collections",
    "System.Collections.Generic",
    "System.Linq",
    "System.Text",
    "System.Threading.Tasks",
];

const RUNTIME_NAMESPACE: &str = "ScriptRuntime";
const PROGRAM_CLASS: &str = "Program";

/// Ordered import list: defaults first, then the config's namespaces in
/// first-seen order. Duplicates and blank entries are dropped.
pub fn namespace_imports(config: &ScriptConfig) -> Vec<&str> {
    let mut seen = HashSet::new();
    DEFAULT_NAMESPACES
        .iter()
        .copied()
        .chain(config.namespaces.iter().map(|ns| ns.trim()))
        .filter(|ns| !ns.is_empty() && seen.insert(*ns))
        .collect()
}

/// Build the program text for a script. Pure; the result is handed to an
/// external compiler.
pub fn synthesize(config: &ScriptConfig, code: &str) -> String {
    let mut program = String::new();

    for ns in namespace_imports(config) {
        push_line(&mut program, &format!("using {ns};"));
    }

    push_line(&mut program, "");
    push_line(&mut program, &format!("namespace {RUNTIME_NAMESPACE}"));
    push_line(&mut program, "{");
    push_line(&mut program, &format!("    public class {PROGRAM_CLASS}"));
    push_line(&mut program, "    {");
    push_line(&mut program, "        public Exception? Exception { get; private set; }");
    push_line(&mut program, "");
    push_line(&mut program, "        public async Task Main()");
    push_line(&mut program, "        {");
    push_line(&mut program, "            try");
    push_line(&mut program, "            {");
    // User code is spliced verbatim.
    push_line(&mut program, code);
    push_line(&mut program, "            }");
    push_line(&mut program, "            catch (Exception ex)");
    push_line(&mut program, "            {");
    push_line(&mut program, "                this.Exception = ex;");
    push_line(&mut program, "            }");
    push_line(&mut program, "        }");
    push_line(&mut program, "    }");
    push_line(&mut program, "}");

    program
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}
