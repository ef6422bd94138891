/// Measures the execution time of some set of instructions.
/// The value of the block is discarded, only the elapsed [std::time::Duration]
/// is returned. Declare anything the block should produce outside of it.
/// ```rs
/// let written;
/// let elapsed = measure_time!(written = write_everything()?;);
/// ```
#[macro_export]
macro_rules! measure_time {
    ($($token:tt)*) => {
        {
            let now = std::time::Instant::now();
            $($token)*
            now.elapsed()
        }
    };
}

/// The purpose of this macro is to be able to generate code for each
/// primitive integer type (this means no f32 or f64).
/// You invoke the macro with the path to another macro that you would
/// like to invoke for each type.
/// Optionally you can restrict generation to either unsigned or signed
/// by typing `;unsigned` or `;signed` after the provided macro argument.
#[macro_export]
macro_rules! for_each_int_type {
    ($macro:path) => {
        $crate::for_each_int_type!($macro;unsigned);
        $crate::for_each_int_type!($macro;signed);
    };
    ($macro:path;unsigned) => {
        $macro!{usize}
        $macro!{u128}
        $macro!{u64}
        $macro!{u32}
        $macro!{u16}
        $macro!{u8}
    };
    ($macro:path;signed) => {
        $macro!{isize}
        $macro!{i128}
        $macro!{i64}
        $macro!{i32}
        $macro!{i16}
        $macro!{i8}
    };
}

/// Continue a loop if a condition is met.
/// ```rs
/// for i in 0..10 {
/// 	continue_if!(i % 2 == 0);
/// 	println!("{i}");
/// }
/// ```
/// Alternatively, you can also use a loop identifier:
/// ```rs
/// 'x: for x in 0..32 {
/// 	'y: for y in 0..32 {
/// 		continue_if!('x: y == 10);
/// 	}
/// }
/// ```
#[macro_export]
macro_rules! continue_if {
    ($($label:lifetime : )? $condition:expr) => {
        if $condition { continue $($label)?; }
    };
}

/// Return from a function if a condition is met.
/// ```rs
/// fn first_even(values: &[i32]) -> Option<i32> {
/// 	for &value in values {
/// 		return_if!(value % 2 == 0 => Some(value));
/// 	}
/// 	None
/// }
/// ```
#[macro_export]
macro_rules! return_if {
    ($condition:expr $(=> $result:expr)?) => {
        if $condition {
            return $($result)?;
        }
    };
}

#[test]
fn print_types() {
    macro_rules! print_type {
        ($token:tt) => {
            println!("{}", stringify!($token));
        };
    }
    for_each_int_type!(print_type);
}

#[test]
fn control_flow_macros() {
    let mut odd = Vec::new();
    for i in 0..10 {
        continue_if!(i % 2 == 0);
        odd.push(i);
    }
    assert_eq!(odd, vec![1, 3, 5, 7, 9]);

    fn first_over(values: &[i32], limit: i32) -> Option<i32> {
        for &value in values {
            return_if!(value > limit => Some(value));
        }
        None
    }
    assert_eq!(first_over(&[1, 4, 9, 16], 5), Some(9));
    assert_eq!(first_over(&[1, 2], 5), None);
}

#[test]
fn measure_elapsed() {
    let sum;
    let elapsed = measure_time!(
        std::thread::sleep(std::time::Duration::from_millis(10));
        sum = (1..=10).sum::<i32>();
    );
    assert_eq!(sum, 55);
    assert!(elapsed >= std::time::Duration::from_millis(10));
}
