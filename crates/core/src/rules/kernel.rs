//! Built-in rules for Linux kernel x86 boot images.

use crate::compiler::{compile_str, CompileResult};
use crate::rules::{Rule, RuleContributor};

/// Boot-sector rules in magic rule syntax.
pub const KERNEL_MAGIC: &str = r#"
# Linux kernel boot images, identified through the x86 real-mode header.
514	string	HdrS	Linux kernel
>510	uleshort	0xAA55	x86 boot executable
>>518	uleshort	>0x1ff
>>>529	byte	0	zImage
>>>529	byte	1	bzImage
>>>526	ulelong	>0
# the version string sits 0x200 past the pointer stored at 526
>>>>(526.s+0x200)	regex/1s	(?-u:[^\x00])	version %s
>>498	uleshort	1	RO-rootFS
>>498	uleshort	0	RW-rootFS
>>508	uleshort	>0	root_dev %#X
>>502	uleshort	>0	swap_dev %#X
>>504	uleshort	>0	RAMdisksize %u KB
>>506	uleshort	0xffff	Normal VGA
>>506	uleshort	0xfffe	Extended VGA
>>506	uleshort	0xfffd	Prompt for Videomode
>>506	uleshort	>0	Video mode %d
"#;

/// Contributor for [`KERNEL_MAGIC`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelRules;

impl RuleContributor for KernelRules {
    fn name(&self) -> &str {
        "kernel"
    }

    fn rules(&self) -> CompileResult<Vec<Rule>> {
        compile_str(KERNEL_MAGIC)
    }
}
